use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use tracing::info;

use billrun::infra::{
    app::create_app, billing_worker::run_billing_loop, setup::init_app_state,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;

    let app = create_app(app_state.clone());

    // Spawn the billing scheduler (after tracing is initialized)
    let orchestrator = Arc::clone(&app_state.orchestrator);
    let billing_poll = Duration::from_secs(app_state.config.billing_poll_secs);
    let retry_poll = Duration::from_secs(app_state.config.retry_poll_secs);
    tokio::spawn(async move {
        run_billing_loop(orchestrator, billing_poll, retry_poll).await;
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Billing engine listening at {}", &listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

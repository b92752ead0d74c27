use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    application::ports::{
        audit_sink::AuditSink, ledger::LedgerWriter, payment_gateway::PaymentGateway,
        plan_catalog::PlanCatalog, subscription_store::SubscriptionStore,
    },
    application::use_cases::{billing::BillingOrchestrator, payment_executor::PaymentExecutor},
    infra::{
        config::AppConfig, http_payment_gateway::HttpPaymentGateway,
        tracing_audit_sink::TracingAuditSink,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;
    let persistence = Arc::new(PostgresPersistence::new(pool));

    let store = persistence.clone() as Arc<dyn SubscriptionStore>;
    let plans = persistence.clone() as Arc<dyn PlanCatalog>;
    let ledger = persistence.clone() as Arc<dyn LedgerWriter>;
    let audit = Arc::new(TracingAuditSink) as Arc<dyn AuditSink>;

    let gateway_timeout = Duration::from_secs(config.gateway_timeout_secs);
    let gateway_api_key = SecretString::new(config.gateway_api_key.expose_secret().into());
    let gateway = Arc::new(HttpPaymentGateway::new(
        config.gateway_url.clone(),
        gateway_api_key,
        gateway_timeout,
    )?) as Arc<dyn PaymentGateway>;

    let executor = PaymentExecutor::new(
        gateway,
        ledger.clone(),
        audit.clone(),
        config.billing_currency.clone(),
        gateway_timeout,
    );
    let orchestrator = BillingOrchestrator::new(
        store,
        plans,
        ledger,
        audit,
        executor,
        config.billing_currency.clone(),
        config.max_concurrent_charges,
    );

    Ok(AppState {
        config: Arc::new(config),
        orchestrator: Arc::new(orchestrator),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "billrun=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true) // show log level
        .pretty(); // human-friendly, with colors

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info};

use crate::{
    app_error::AppResult,
    application::use_cases::billing::{BillingOrchestrator, RunSummary},
};

/// Scheduler driving the billing engine. Each tick runs the batch to
/// completion; a failed run is logged and the loop keeps going.
pub async fn run_billing_loop(
    orchestrator: Arc<BillingOrchestrator>,
    billing_poll: Duration,
    retry_poll: Duration,
) {
    let mut billing_ticker = interval(billing_poll);
    let mut retry_ticker = interval(retry_poll);

    info!(
        "Billing worker started (billing every {}s, retries every {}s)",
        billing_poll.as_secs(),
        retry_poll.as_secs()
    );

    loop {
        tokio::select! {
            _ = billing_ticker.tick() => {
                let now = Utc::now();
                log_run("recurring_billing", orchestrator.run_recurring_billing(now).await);
                log_run("renewals", orchestrator.run_renewals(now).await);
            }
            _ = retry_ticker.tick() => {
                log_run("payment_retries", orchestrator.run_retries(Utc::now()).await);
            }
        }
    }
}

fn log_run(operation: &str, result: AppResult<RunSummary>) {
    match result {
        Ok(summary) => info!(
            operation,
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Billing run finished"
        ),
        Err(e) => error!(operation, error = %e, "Billing run failed"),
    }
}

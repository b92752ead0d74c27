use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{error, warn};

use crate::{
    application::ports::{
        audit_sink::{self, AuditEvent, AuditSink},
        ledger::LedgerWriter,
        payment_gateway::{ChargeOutcome, ChargeRequest, PaymentGateway},
    },
    domain::entities::{billing_record::BillingRecord, subscription::Subscription},
};

/// Outcome of a single charge attempt, consumed by the orchestrator to
/// decide the next subscription state.
#[derive(Debug, Clone)]
pub struct BillingAttemptResult {
    pub success: bool,
    pub transaction_ref: Option<String>,
    pub error_message: Option<String>,
}

impl BillingAttemptResult {
    fn approved(transaction_ref: String) -> Self {
        Self {
            success: true,
            transaction_ref: Some(transaction_ref),
            error_message: None,
        }
    }

    fn failed(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_ref: None,
            error_message: Some(error_message.into()),
        }
    }
}

/// Wraps a single charge attempt against the payment gateway and records
/// the outcome to the billing ledger.
#[derive(Clone)]
pub struct PaymentExecutor {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn LedgerWriter>,
    audit: Arc<dyn AuditSink>,
    currency: String,
    gateway_timeout: Duration,
}

impl PaymentExecutor {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn LedgerWriter>,
        audit: Arc<dyn AuditSink>,
        currency: String,
        gateway_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            ledger,
            audit,
            currency,
            gateway_timeout,
        }
    }

    /// One charge attempt.
    ///
    /// A successful charge is appended to the ledger; a failed ledger write
    /// is logged and swallowed because the money already moved and must not
    /// be billed again. A failed charge writes nothing to the revenue
    /// stream; a best-effort audit event covers it. A gateway call that
    /// exceeds the timeout counts as a failure for retry accounting.
    pub async fn charge(
        &self,
        subscription: &Subscription,
        amount: Decimal,
        description: &str,
        now: DateTime<Utc>,
    ) -> BillingAttemptResult {
        let request = ChargeRequest {
            customer_ref: subscription.customer_ref.clone(),
            amount,
            currency: self.currency.clone(),
            idempotency_key: format!(
                "{}:{}",
                subscription.id,
                subscription.next_billing_date.timestamp()
            ),
        };

        let outcome =
            tokio::time::timeout(self.gateway_timeout, self.gateway.charge(&request)).await;

        let result = match outcome {
            Ok(Ok(ChargeOutcome::Approved { transaction_ref })) => {
                let record = BillingRecord::new(
                    subscription.id,
                    subscription.end_user_id,
                    amount,
                    &self.currency,
                    description,
                    Some(transaction_ref.clone()),
                    now,
                );
                if let Err(e) = self.ledger.append(&record).await {
                    // The charge went through; losing the ledger row must
                    // not trigger a second attempt.
                    error!(
                        subscription_id = %subscription.id,
                        transaction_ref = %transaction_ref,
                        error = %e,
                        "Charge succeeded but ledger append failed"
                    );
                }
                BillingAttemptResult::approved(transaction_ref)
            }
            Ok(Ok(ChargeOutcome::Declined { reason })) => BillingAttemptResult::failed(reason),
            Ok(Err(e)) => BillingAttemptResult::failed(format!("gateway error: {e}")),
            Err(_) => BillingAttemptResult::failed(format!(
                "gateway timed out after {}s",
                self.gateway_timeout.as_secs()
            )),
        };

        let event = if result.success {
            AuditEvent::new(
                subscription.id,
                audit_sink::PAYMENT_SUCCEEDED,
                json!({ "amount": amount, "transaction_ref": result.transaction_ref }),
                now,
            )
        } else {
            AuditEvent::new(
                subscription.id,
                audit_sink::PAYMENT_FAILED,
                json!({ "amount": amount, "error": result.error_message }),
                now,
            )
        };
        if let Err(e) = self.audit.emit(event).await {
            warn!(subscription_id = %subscription.id, error = %e, "Audit emit failed");
        }

        result
    }
}

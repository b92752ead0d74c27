use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::billing_calculator,
    application::ports::{
        audit_sink::{self, AuditEvent, AuditSink},
        ledger::LedgerWriter,
        plan_catalog::PlanCatalog,
        subscription_store::{SubscriptionStore, UpdateOutcome},
    },
    application::use_cases::payment_executor::PaymentExecutor,
    domain::entities::{
        billing_record::BillingRecord,
        subscription::{Subscription, SubscriptionStatus},
    },
};

/// How close to its end date a subscription becomes a renewal candidate.
const RENEWAL_WINDOW_DAYS: i64 = 7;

/// Counts for one batch run, one line of observability per trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: ItemOutcome) {
        self.processed += 1;
        match outcome {
            ItemOutcome::Succeeded => self.succeeded += 1,
            ItemOutcome::Failed => self.failed += 1,
            ItemOutcome::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchKind {
    Recurring,
    Renewal,
    Retry,
}

impl BatchKind {
    fn charge_description(&self) -> &'static str {
        match self {
            BatchKind::Recurring => "recurring subscription charge",
            BatchKind::Renewal => "subscription renewal charge",
            BatchKind::Retry => "failed payment retry charge",
        }
    }
}

/// Result of an operator-triggered plan change.
#[derive(Debug, Clone, Serialize)]
pub struct PlanChangeOutcome {
    pub subscription_id: Uuid,
    pub previous_plan_id: Uuid,
    pub new_plan_id: Uuid,
    pub prorated_amount: Decimal,
    pub currency: String,
    pub effective_at: DateTime<Utc>,
}

/// Result of an operator-triggered immediate charge.
#[derive(Debug, Clone, Serialize)]
pub struct ManualBillingOutcome {
    pub subscription_id: Uuid,
    pub success: bool,
    pub status: SubscriptionStatus,
    pub error_message: Option<String>,
}

/// The engine core: scans due subscriptions and drives the per-subscription
/// state transitions (bill / renew / retry / suspend).
///
/// Each batch isolates per-item failures, so one bad record never aborts
/// the rest, and every state change is persisted with a conditional write:
/// overlapping runs cannot advance the same cycle twice.
#[derive(Clone)]
pub struct BillingOrchestrator {
    store: Arc<dyn SubscriptionStore>,
    plans: Arc<dyn PlanCatalog>,
    ledger: Arc<dyn LedgerWriter>,
    audit: Arc<dyn AuditSink>,
    executor: PaymentExecutor,
    currency: String,
    max_concurrent_charges: usize,
}

impl BillingOrchestrator {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        plans: Arc<dyn PlanCatalog>,
        ledger: Arc<dyn LedgerWriter>,
        audit: Arc<dyn AuditSink>,
        executor: PaymentExecutor,
        currency: String,
        max_concurrent_charges: usize,
    ) -> Self {
        Self {
            store,
            plans,
            ledger,
            audit,
            executor,
            currency,
            max_concurrent_charges,
        }
    }

    /// Charge every subscription whose next billing date has arrived.
    ///
    /// A failure to read the batch itself is fatal for the run; everything
    /// past that point is isolated per subscription.
    pub async fn run_recurring_billing(&self, now: DateTime<Utc>) -> AppResult<RunSummary> {
        let due = self.store.get_due_for_billing(now).await?;
        info!(count = due.len(), "Processing recurring billing");
        Ok(self.run_batch(BatchKind::Recurring, due, now).await)
    }

    /// Attempt renewal for subscriptions whose end date falls within the
    /// renewal window.
    pub async fn run_renewals(&self, now: DateTime<Utc>) -> AppResult<RunSummary> {
        let cutoff = now + Duration::days(RENEWAL_WINDOW_DAYS);
        let expiring = self.store.get_nearing_expiry(cutoff).await?;
        info!(count = expiring.len(), "Processing subscription renewals");
        Ok(self.run_batch(BatchKind::Renewal, expiring, now).await)
    }

    /// Retry subscriptions stuck in `PaymentFailed`. The third consecutive
    /// failure suspends; this is the sole automatic path into `Suspended`.
    pub async fn run_retries(&self, now: DateTime<Utc>) -> AppResult<RunSummary> {
        let failed = self
            .store
            .get_by_status(SubscriptionStatus::PaymentFailed)
            .await?;
        info!(count = failed.len(), "Processing failed payment retries");
        Ok(self.run_batch(BatchKind::Retry, failed, now).await)
    }

    async fn run_batch(
        &self,
        kind: BatchKind,
        subscriptions: Vec<Subscription>,
        now: DateTime<Utc>,
    ) -> RunSummary {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_charges));
        let mut handles = Vec::with_capacity(subscriptions.len());

        for subscription in subscriptions {
            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                orchestrator.process_one(kind, subscription, now).await
            }));
        }

        let mut summary = RunSummary::default();
        for handle in handles {
            match handle.await {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    error!(error = %e, "Billing task panicked");
                    summary.record(ItemOutcome::Failed);
                }
            }
        }
        summary
    }

    async fn process_one(
        &self,
        kind: BatchKind,
        subscription: Subscription,
        now: DateTime<Utc>,
    ) -> ItemOutcome {
        // Re-validate against the current clock: the batch query may have
        // returned stale rows, and re-running an operation on an item that
        // already moved on must be a no-op.
        if !self.eligible(kind, &subscription, now) {
            return ItemOutcome::Skipped;
        }
        self.charge_and_persist(kind, subscription, now).await.0
    }

    fn eligible(&self, kind: BatchKind, subscription: &Subscription, now: DateTime<Utc>) -> bool {
        match kind {
            BatchKind::Recurring => {
                subscription.status == SubscriptionStatus::Active && subscription.is_due(now)
            }
            BatchKind::Renewal => {
                matches!(
                    subscription.status,
                    SubscriptionStatus::Active | SubscriptionStatus::Expired
                ) && subscription
                    .end_date
                    .is_some_and(|end| end <= now + Duration::days(RENEWAL_WINDOW_DAYS))
            }
            BatchKind::Retry => subscription.status == SubscriptionStatus::PaymentFailed,
        }
    }

    /// One charge attempt plus the conditional persist of its outcome.
    /// Returns the batch outcome and the (possibly transitioned)
    /// subscription for callers that report single-item results.
    async fn charge_and_persist(
        &self,
        kind: BatchKind,
        mut subscription: Subscription,
        now: DateTime<Utc>,
    ) -> (ItemOutcome, Subscription) {
        let cycle = match subscription.billing_cycle() {
            Ok(cycle) => cycle,
            Err(e) => {
                error!(
                    subscription_id = %subscription.id,
                    error = %e,
                    "Refusing to bill subscription with corrupt billing data"
                );
                return (ItemOutcome::Failed, subscription);
            }
        };

        let attempt = self
            .executor
            .charge(
                &subscription,
                subscription.plan_price,
                kind.charge_description(),
                now,
            )
            .await;

        let mut newly_suspended = false;
        if attempt.success {
            match kind {
                BatchKind::Renewal => subscription.record_renewal_success(now, cycle),
                BatchKind::Recurring | BatchKind::Retry => {
                    subscription.record_charge_success(now, cycle)
                }
            }
        } else {
            let reason = attempt
                .error_message
                .clone()
                .unwrap_or_else(|| "payment declined".to_string());
            match kind {
                BatchKind::Retry => {
                    newly_suspended = subscription.record_retry_failure(now, reason);
                }
                BatchKind::Recurring | BatchKind::Renewal => {
                    subscription.record_charge_failure(now, reason)
                }
            }
        }

        match self.store.update(&subscription).await {
            Ok(UpdateOutcome::Applied) => {
                if attempt.success && kind == BatchKind::Renewal {
                    self.emit_audit(AuditEvent::new(
                        subscription.id,
                        audit_sink::SUBSCRIPTION_RENEWED,
                        json!({ "end_date": subscription.end_date }),
                        now,
                    ))
                    .await;
                }
                if newly_suspended {
                    self.emit_audit(AuditEvent::new(
                        subscription.id,
                        audit_sink::SUBSCRIPTION_SUSPENDED,
                        json!({
                            "failed_payment_attempts": subscription.failed_payment_attempts,
                        }),
                        now,
                    ))
                    .await;
                }
                let outcome = if attempt.success {
                    ItemOutcome::Succeeded
                } else {
                    ItemOutcome::Failed
                };
                (outcome, subscription)
            }
            Ok(UpdateOutcome::Conflict) => {
                warn!(
                    subscription_id = %subscription.id,
                    "Concurrent update won the race, skipping this cycle"
                );
                (ItemOutcome::Skipped, subscription)
            }
            Err(e) => {
                error!(
                    subscription_id = %subscription.id,
                    error = %e,
                    "Failed to persist billing outcome"
                );
                (ItemOutcome::Failed, subscription)
            }
        }
    }

    /// Switch a subscription to a new plan mid-cycle.
    ///
    /// The remainder of the current cycle is prorated under the *current*
    /// plan price and recorded in the ledger; no gateway charge happens on
    /// this path; whether to collect the adjustment is the ledger
    /// consumer's policy. Billing status and schedule stay untouched.
    pub async fn process_plan_change(
        &self,
        subscription_id: Uuid,
        new_plan_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<PlanChangeOutcome> {
        let mut subscription = self
            .store
            .get_by_id(subscription_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let new_plan = self
            .plans
            .get_by_id(new_plan_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let cycle = subscription.billing_cycle()?;
        let prorated = billing_calculator::prorated_amount(
            subscription.plan_price,
            cycle,
            subscription.next_billing_date,
            now,
        );

        let previous_plan_id = subscription.plan_id;
        subscription.change_plan(new_plan.id, new_plan.price, new_plan.billing_cycle_days);

        match self.store.update(&subscription).await? {
            UpdateOutcome::Applied => {}
            UpdateOutcome::Conflict => return Err(AppError::Conflict),
        }

        // Recording the adjustment is mandatory; a lost record here is a
        // real error, unlike the post-charge ledger append.
        let record = BillingRecord::new(
            subscription.id,
            subscription.end_user_id,
            prorated,
            &self.currency,
            &format!(
                "plan change {previous_plan_id} -> {new_plan_id}, prorated remainder of current cycle"
            ),
            None,
            now,
        );
        self.ledger.append(&record).await?;

        self.emit_audit(AuditEvent::new(
            subscription.id,
            audit_sink::PLAN_CHANGED,
            json!({
                "previous_plan_id": previous_plan_id,
                "new_plan_id": new_plan_id,
                "prorated_amount": prorated,
            }),
            now,
        ))
        .await;

        Ok(PlanChangeOutcome {
            subscription_id,
            previous_plan_id,
            new_plan_id,
            prorated_amount: prorated,
            currency: self.currency.clone(),
            effective_at: now,
        })
    }

    /// Operator-triggered immediate charge, bypassing the due check.
    ///
    /// An `Active` subscription follows the recurring transition, a
    /// `PaymentFailed` one the retry transition (ceiling included);
    /// suspended and expired subscriptions are rejected.
    pub async fn process_manual_billing(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<ManualBillingOutcome> {
        let subscription = self
            .store
            .get_by_id(subscription_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let kind = match subscription.status {
            SubscriptionStatus::Active => BatchKind::Recurring,
            SubscriptionStatus::PaymentFailed => BatchKind::Retry,
            status => {
                return Err(AppError::InvalidInput(format!(
                    "subscription status {} is not billable",
                    status.as_str()
                )));
            }
        };

        let (outcome, subscription) = self.charge_and_persist(kind, subscription, now).await;
        Ok(ManualBillingOutcome {
            subscription_id,
            success: outcome == ItemOutcome::Succeeded,
            status: subscription.status,
            error_message: subscription.last_payment_error.clone(),
        })
    }

    async fn emit_audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.emit(event).await {
            warn!(error = %e, "Audit emit failed");
        }
    }
}

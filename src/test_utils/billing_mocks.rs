//! In-memory mock implementations for the engine's ports.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        audit_sink::{AuditEvent, AuditSink},
        ledger::LedgerWriter,
        payment_gateway::{ChargeOutcome, ChargeRequest, PaymentGateway},
        plan_catalog::{PlanCatalog, PlanProfile},
        subscription_store::{SubscriptionStore, UpdateOutcome},
    },
    domain::entities::{
        billing_record::BillingRecord,
        subscription::{Subscription, SubscriptionStatus},
    },
};

// ============================================================================
// MockPaymentGateway
// ============================================================================

enum ScriptedOutcome {
    Approve(String),
    Decline(String),
    Error(String),
}

/// Scripted gateway: pops one outcome per charge, falling back to blanket
/// approval when `always_approve` is set.
#[derive(Default)]
pub struct MockPaymentGateway {
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    default_approve: Mutex<bool>,
    delay: Mutex<Option<Duration>>,
    pub requests: Mutex<Vec<ChargeRequest>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_approval(&self, transaction_ref: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Approve(transaction_ref.to_string()));
    }

    pub fn push_decline(&self, reason: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Decline(reason.to_string()));
    }

    pub fn push_error(&self, message: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Error(message.to_string()));
    }

    pub fn always_approve(&self) {
        *self.default_approve.lock().unwrap() = true;
    }

    /// Delay every charge call, for timeout tests.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> AppResult<ChargeOutcome> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.requests.lock().unwrap().push(request.clone());

        let scripted = self.outcomes.lock().unwrap().pop_front();
        match scripted {
            Some(ScriptedOutcome::Approve(transaction_ref)) => {
                Ok(ChargeOutcome::Approved { transaction_ref })
            }
            Some(ScriptedOutcome::Decline(reason)) => Ok(ChargeOutcome::Declined { reason }),
            Some(ScriptedOutcome::Error(message)) => Err(AppError::Gateway(message)),
            None if *self.default_approve.lock().unwrap() => Ok(ChargeOutcome::Approved {
                transaction_ref: format!("txn_{}", Uuid::new_v4()),
            }),
            None => Ok(ChargeOutcome::Declined {
                reason: "no scripted outcome".to_string(),
            }),
        }
    }
}

// ============================================================================
// InMemorySubscriptionStore
// ============================================================================

/// Version-checked in-memory store mirroring the conditional-write contract
/// of the Postgres adapter.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    pub subscriptions: Mutex<HashMap<Uuid, Subscription>>,
    conflict_all_updates: Mutex<bool>,
    fail_all_reads: Mutex<bool>,
}

impl InMemorySubscriptionStore {
    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        let map: HashMap<Uuid, Subscription> =
            subscriptions.into_iter().map(|s| (s.id, s)).collect();
        Self {
            subscriptions: Mutex::new(map),
            ..Self::default()
        }
    }

    /// Snapshot of a stored record, for assertions.
    pub fn get(&self, id: Uuid) -> Option<Subscription> {
        self.subscriptions.lock().unwrap().get(&id).cloned()
    }

    /// Replace a stored record wholesale, bypassing the version check.
    pub fn put(&self, subscription: Subscription) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.id, subscription);
    }

    /// Make every update lose the optimistic-concurrency race.
    pub fn fail_updates_with_conflict(&self, fail: bool) {
        *self.conflict_all_updates.lock().unwrap() = fail;
    }

    /// Make every read fail, simulating an unreachable store.
    pub fn fail_reads(&self, fail: bool) {
        *self.fail_all_reads.lock().unwrap() = fail;
    }

    fn check_reads(&self) -> AppResult<()> {
        if *self.fail_all_reads.lock().unwrap() {
            return Err(AppError::Database("store unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        self.check_reads()?;
        Ok(self.subscriptions.lock().unwrap().get(&id).cloned())
    }

    async fn get_due_for_billing(&self, as_of: DateTime<Utc>) -> AppResult<Vec<Subscription>> {
        self.check_reads()?;
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.status == SubscriptionStatus::Active && s.next_billing_date <= as_of)
            .cloned()
            .collect())
    }

    async fn get_nearing_expiry(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Subscription>> {
        self.check_reads()?;
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| {
                matches!(
                    s.status,
                    SubscriptionStatus::Active | SubscriptionStatus::Expired
                ) && s.end_date.is_some_and(|end| end <= cutoff)
            })
            .cloned()
            .collect())
    }

    async fn get_by_status(
        &self,
        status: SubscriptionStatus,
    ) -> AppResult<Vec<Subscription>> {
        self.check_reads()?;
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect())
    }

    async fn update(&self, subscription: &Subscription) -> AppResult<UpdateOutcome> {
        if *self.conflict_all_updates.lock().unwrap() {
            return Ok(UpdateOutcome::Conflict);
        }

        let mut subscriptions = self.subscriptions.lock().unwrap();
        match subscriptions.get(&subscription.id) {
            Some(stored) if stored.version == subscription.version => {
                let mut updated = subscription.clone();
                updated.version += 1;
                updated.updated_at = Some(Utc::now());
                subscriptions.insert(updated.id, updated);
                Ok(UpdateOutcome::Applied)
            }
            Some(_) | None => Ok(UpdateOutcome::Conflict),
        }
    }
}

// ============================================================================
// InMemoryLedger
// ============================================================================

#[derive(Default)]
pub struct InMemoryLedger {
    pub records: Mutex<Vec<BillingRecord>>,
    fail_all_appends: Mutex<bool>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_appends(&self, fail: bool) {
        *self.fail_all_appends.lock().unwrap() = fail;
    }
}

#[async_trait]
impl LedgerWriter for InMemoryLedger {
    async fn append(&self, record: &BillingRecord) -> AppResult<()> {
        if *self.fail_all_appends.lock().unwrap() {
            return Err(AppError::Database("ledger write failed".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ============================================================================
// CapturingAuditSink
// ============================================================================

#[derive(Default)]
pub struct CapturingAuditSink {
    pub events: Mutex<Vec<AuditEvent>>,
    fail_all_emits: Mutex<bool>,
}

impl CapturingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_emits(&self, fail: bool) {
        *self.fail_all_emits.lock().unwrap() = fail;
    }
}

#[async_trait]
impl AuditSink for CapturingAuditSink {
    async fn emit(&self, event: AuditEvent) -> AppResult<()> {
        if *self.fail_all_emits.lock().unwrap() {
            return Err(AppError::Internal("audit sink down".to_string()));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

// ============================================================================
// InMemoryPlanCatalog
// ============================================================================

#[derive(Default)]
pub struct InMemoryPlanCatalog {
    pub plans: Mutex<HashMap<Uuid, PlanProfile>>,
}

impl InMemoryPlanCatalog {
    pub fn with_plans(plans: Vec<PlanProfile>) -> Self {
        let map: HashMap<Uuid, PlanProfile> = plans.into_iter().map(|p| (p.id, p)).collect();
        Self {
            plans: Mutex::new(map),
        }
    }
}

#[async_trait]
impl PlanCatalog for InMemoryPlanCatalog {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PlanProfile>> {
        Ok(self.plans.lock().unwrap().get(&id).cloned())
    }
}

//! Wires an orchestrator over the in-memory mocks.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    application::ports::plan_catalog::PlanProfile,
    application::use_cases::{billing::BillingOrchestrator, payment_executor::PaymentExecutor},
    domain::entities::subscription::Subscription,
    test_utils::billing_mocks::{
        CapturingAuditSink, InMemoryLedger, InMemoryPlanCatalog, InMemorySubscriptionStore,
        MockPaymentGateway,
    },
};

const TEST_GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);
const TEST_MAX_CONCURRENT_CHARGES: usize = 4;

pub struct TestHarness {
    pub store: Arc<InMemorySubscriptionStore>,
    pub gateway: Arc<MockPaymentGateway>,
    pub ledger: Arc<InMemoryLedger>,
    pub audit: Arc<CapturingAuditSink>,
    pub plans: Arc<InMemoryPlanCatalog>,
    pub orchestrator: BillingOrchestrator,
}

impl TestHarness {
    pub fn new(subscriptions: Vec<Subscription>) -> Self {
        Self::with_plans(subscriptions, Vec::new())
    }

    pub fn with_plans(subscriptions: Vec<Subscription>, plans: Vec<PlanProfile>) -> Self {
        let store = Arc::new(InMemorySubscriptionStore::with_subscriptions(subscriptions));
        let gateway = Arc::new(MockPaymentGateway::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let audit = Arc::new(CapturingAuditSink::new());
        let plan_catalog = Arc::new(InMemoryPlanCatalog::with_plans(plans));

        let executor = PaymentExecutor::new(
            gateway.clone(),
            ledger.clone(),
            audit.clone(),
            "usd".to_string(),
            TEST_GATEWAY_TIMEOUT,
        );
        let orchestrator = BillingOrchestrator::new(
            store.clone(),
            plan_catalog.clone(),
            ledger.clone(),
            audit.clone(),
            executor,
            "usd".to_string(),
            TEST_MAX_CONCURRENT_CHARGES,
        );

        Self {
            store,
            gateway,
            ledger,
            audit,
            plans: plan_catalog,
            orchestrator,
        }
    }
}

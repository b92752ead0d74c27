use std::sync::Arc;

use crate::{application::use_cases::billing::BillingOrchestrator, infra::config::AppConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub orchestrator: Arc<BillingOrchestrator>,
}

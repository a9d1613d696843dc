// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::refresh_scheduler::RefreshScheduler;
use crate::application::stores::CredentialStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<RefreshScheduler>,
    pub dashboard_service: DashboardService,
    pub credentials: Arc<dyn CredentialStore>,
}

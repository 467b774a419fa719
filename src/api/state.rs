//! Application state for shared services

use std::sync::Arc;

use crate::domain::ConfigStore;
use crate::infrastructure::cache::ConfigCache;
use crate::infrastructure::services::{AdminService, ConfigService};
use crate::infrastructure::session::SessionService;

/// Services shared by all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub config_service: ConfigService,
    pub admin_service: AdminService,
    pub session_service: SessionService,
    /// Used directly by readiness checks
    pub store: Arc<dyn ConfigStore>,
    pub cache: ConfigCache,
    /// Take the client id from `X-Forwarded-For`
    pub trust_forwarded_for: bool,
}

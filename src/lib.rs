pub mod config;
pub mod rest;
pub mod store;

use std::sync::Arc;

use config::DaemonConfig;
use store::TaskStore;

/// Shared application state handed to every REST handler.
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    pub store: Arc<TaskStore>,
    pub started_at: std::time::Instant,
}

//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::Config;
use crate::db::repository::FullRepository;
use crate::services::report_tracker::ReportTracker;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for data access
    pub repository: Arc<dyn FullRepository>,
    /// Registry of report runs
    pub reports: ReportTracker,
    /// Engine configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(repository: Arc<dyn FullRepository>, config: Config) -> Self {
        Self {
            repository,
            reports: ReportTracker::new(),
            config: Arc::new(config),
        }
    }
}

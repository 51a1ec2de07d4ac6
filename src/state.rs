//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;

/// Application handle passed to the router.
///
/// Built once in `main` from the loaded configuration and cloned into each
/// handler. The configuration is immutable after startup, so no locking is needed.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Creates a new application state from the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Display title of this service.
    pub fn title(&self) -> &str {
        &self.config.app.title
    }
}

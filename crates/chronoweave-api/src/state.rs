//! Shared application state.

use std::sync::Arc;

use chronoweave_sync::application::manager::SynchronizationManager;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runs turns and validation passes. Holds no World Model: callers send
    /// theirs with every request.
    pub manager: Arc<SynchronizationManager>,
    /// Which content generator the manager was built with.
    pub generator_kind: &'static str,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(manager: SynchronizationManager, generator_kind: &'static str) -> Self {
        Self {
            manager: Arc::new(manager),
            generator_kind,
        }
    }
}

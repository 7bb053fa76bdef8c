//! Shared application state.

use crate::backend;
use crate::config::Config;
use crate::executor::Executor;
use std::sync::Arc;

/// Handed to every request handler. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct AppState {
    pub executor: Executor,
}

impl AppState {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// State for the backend selected in `config`.
    pub fn from_config(config: Config) -> Self {
        let backend = backend::for_language(&config);
        Self::new(Executor::new(Arc::new(config), backend))
    }

    pub fn config(&self) -> &Config {
        self.executor.config()
    }
}

//! Application state shared across HTTP handlers

use std::sync::Arc;

use crate::config::Config;
use crate::core::orchestrator::Orchestrator;
use crate::core::registry::FunctionRegistry;

/// HTTP server state shared across handlers
///
/// All fields are `Arc`s over immutable startup-time state; handlers share
/// them read-only across worker threads.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration (shared read-only)
    pub config: Arc<Config>,
    /// Function registry, built once at startup
    pub registry: Arc<FunctionRegistry>,
    /// The function-calling control loop
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create a new AppState with shared resources
    pub fn new(
        config: Config,
        registry: Arc<FunctionRegistry>,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            orchestrator,
        }
    }
}

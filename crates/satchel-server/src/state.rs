//! Shared application state.

use std::sync::Arc;

use satchel_session::SessionRegistry;

use crate::config::ServerConfig;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    registry: SessionRegistry,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Create state around an existing registry.
    pub fn new(registry: SessionRegistry, config: ServerConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config),
        }
    }

    /// The session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

//! CLI command handlers.

pub mod config;
pub mod serve;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use satchel_session::{SessionConfig, load_config_file};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Session config file, if one was given.
    pub config_path: Option<PathBuf>,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Load the session configuration, falling back to defaults.
    pub fn session_config(&self) -> Result<SessionConfig> {
        match &self.config_path {
            Some(path) => load_config_file(path)
                .with_context(|| format!("loading session config from {}", path.display())),
            None => Ok(SessionConfig::default()),
        }
    }
}

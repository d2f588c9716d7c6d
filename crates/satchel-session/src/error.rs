//! Error types for session registry operations.

/// Error type for session registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Neither the cookie nor the header carried a usable identifier.
    #[error("Session identifier not found")]
    IdentifierNotFound,

    /// An identifier was present but could not be decoded.
    #[error("Malformed session identifier: {0}")]
    IdentifierMalformed(String),

    /// The identifier is valid but no session is registered under it.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// An argument was rejected (e.g., an empty identifier).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for session registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading session configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to parse JSON.
    #[error("failed to parse JSON config: {0}")]
    ParseJson(#[from] serde_json::Error),

    /// Failed to serialize config.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field holds a value the registry cannot run with.
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

//! In-memory HTTP session registry with idle expiry.
//!
//! This crate provides:
//! - [`Session`], a concurrently accessible key/value bag with a last-access time
//! - [`SessionRegistry`], the identifier → session table with
//!   create/read/update/destroy/refresh operations
//! - identifier extraction from request headers (cookie first, then an
//!   optional header)
//! - [`Sweeper`], a cancellable background task evicting idle sessions
//!
//! # Example
//!
//! ```rust,ignore
//! use satchel_session::{SessionConfig, SessionRegistry, Sweeper};
//!
//! let config = SessionConfig::default()
//!     .with_max_lifetime(Duration::from_secs(1800))
//!     .with_http_header("X-Session-Id");
//!
//! let registry = SessionRegistry::new(config);
//! let sweeper = Sweeper::new(registry.clone()).spawn();
//!
//! let session = registry.read_or_create(request.headers())?;
//! session.set("user".to_string(), json!("alice"));
//! ```

mod config;
mod error;
mod extract;
mod registry;
mod session;
mod sweeper;

pub use config::{
    CookieSettings, DEFAULT_CLEANER_INTERVAL, DEFAULT_COOKIE_NAME, DEFAULT_MAX_LIFETIME,
    DEFAULT_SESSION_HEADER, MAX_CLEANER_INTERVAL, SessionConfig, SessionSection,
    load_config_file,
};
pub use error::{ConfigError, Error, Result};
pub use registry::SessionRegistry;
pub use session::Session;
pub use sweeper::{Sweeper, SweeperHandle};

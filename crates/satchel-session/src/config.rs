//! Configuration for the session registry.
//!
//! [`SessionConfig`] is the runtime form handed to
//! [`SessionRegistry::new`](crate::SessionRegistry::new). [`SessionSection`]
//! is the on-disk form, loaded from TOML (or JSON for `.json` files) with
//! every field optional.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default cookie carrying the session identifier.
pub const DEFAULT_COOKIE_NAME: &str = "sessionid";

/// Default header carrying the session identifier (when enabled).
pub const DEFAULT_SESSION_HEADER: &str = "X-Session-Id";

/// Default delay between expiry sweeps.
pub const DEFAULT_CLEANER_INTERVAL: Duration = Duration::from_secs(60);

/// Longest accepted delay between expiry sweeps.
pub const MAX_CLEANER_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Default idle lifetime before a session is evicted.
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// Attributes for the cookie the HTTP layer sets with a session identifier.
///
/// The registry only reads the cookie named here; writing `Set-Cookie`
/// headers is left to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    /// Cookie name.
    pub name: String,

    /// `Domain` attribute, omitted when `None`.
    pub domain: Option<String>,

    /// `Path` attribute.
    pub path: String,

    /// Whether to set the `Secure` attribute.
    pub secure: bool,

    /// Whether to set the `HttpOnly` attribute.
    pub http_only: bool,

    /// `Max-Age` of the cookie. Zero means a browser-session cookie.
    pub lifetime: Duration,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            domain: None,
            path: "/".to_string(),
            secure: false,
            http_only: true,
            lifetime: Duration::ZERO,
        }
    }
}

/// Configuration for the session registry.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between consecutive expiry sweeps.
    pub cleaner_interval: Duration,

    /// Idle time after which a session is eligible for eviction.
    pub max_lifetime: Duration,

    /// Whether identifiers may also be taken from [`Self::session_header`].
    pub enable_http_header: bool,

    /// Header carrying the identifier when header extraction is enabled.
    pub session_header: String,

    /// Whether reads bump a session's last-access time.
    pub auto_refresh: bool,

    /// Cookie attributes.
    pub cookie: CookieSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cleaner_interval: DEFAULT_CLEANER_INTERVAL,
            max_lifetime: DEFAULT_MAX_LIFETIME,
            enable_http_header: false,
            session_header: DEFAULT_SESSION_HEADER.to_string(),
            auto_refresh: true,
            cookie: CookieSettings::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sweep interval.
    pub fn with_cleaner_interval(mut self, interval: Duration) -> Self {
        self.cleaner_interval = interval;
        self
    }

    /// Set the idle lifetime.
    pub fn with_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Enable header extraction using the given header name.
    pub fn with_http_header(mut self, name: impl Into<String>) -> Self {
        self.enable_http_header = true;
        self.session_header = name.into();
        self
    }

    /// Disable header extraction.
    pub fn without_http_header(mut self) -> Self {
        self.enable_http_header = false;
        self
    }

    /// Enable or disable refreshing the last-access time on reads.
    pub fn with_auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }

    /// Set the cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie.name = name.into();
        self
    }

    /// Replace all cookie attributes.
    pub fn with_cookie(mut self, cookie: CookieSettings) -> Self {
        self.cookie = cookie;
        self
    }

    /// Idle lifetime actually applied by the sweep.
    ///
    /// A zero lifetime falls back to the cleaner interval.
    pub fn effective_max_lifetime(&self) -> Duration {
        if self.max_lifetime.is_zero() {
            self.cleaner_interval
        } else {
            self.max_lifetime
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File form
// ─────────────────────────────────────────────────────────────────────────────

/// Session configuration as written in a config file.
///
/// The unsuffixed keys `cleaner_interval`, `max_lifetime` and
/// `cookie_lifetime` are accepted as aliases, so older JSON deployment
/// files load unchanged.
///
/// ```toml
/// cookie_name = "sessionid"
/// cleaner_interval_secs = 60
/// max_lifetime_secs = 1800
/// http_only = true
/// secure = false
/// cookie_lifetime_secs = 0
/// domain = "example.com"
/// enable_http_header = true
/// session_header = "X-Session-Id"
/// auto_refresh = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub cookie_name: String,
    #[serde(alias = "cleaner_interval")]
    pub cleaner_interval_secs: u64,
    /// Zero falls back to `cleaner_interval_secs`.
    #[serde(alias = "max_lifetime")]
    pub max_lifetime_secs: u64,
    pub http_only: bool,
    pub secure: bool,
    #[serde(alias = "cookie_lifetime")]
    pub cookie_lifetime_secs: u64,
    pub cookie_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub enable_http_header: bool,
    pub session_header: String,
    pub auto_refresh: bool,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionSection {
    fn from(config: &SessionConfig) -> Self {
        Self {
            cookie_name: config.cookie.name.clone(),
            cleaner_interval_secs: config.cleaner_interval.as_secs(),
            max_lifetime_secs: config.max_lifetime.as_secs(),
            http_only: config.cookie.http_only,
            secure: config.cookie.secure,
            cookie_lifetime_secs: config.cookie.lifetime.as_secs(),
            cookie_path: config.cookie.path.clone(),
            domain: config.cookie.domain.clone(),
            enable_http_header: config.enable_http_header,
            session_header: config.session_header.clone(),
            auto_refresh: config.auto_refresh,
        }
    }
}

impl SessionSection {
    /// Parse a section from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Parse a section from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate and convert into the runtime configuration.
    pub fn into_config(self) -> Result<SessionConfig, ConfigError> {
        if self.cleaner_interval_secs == 0 {
            return Err(invalid("cleaner_interval_secs", "must be greater than zero"));
        }
        if self.cleaner_interval_secs > MAX_CLEANER_INTERVAL.as_secs() {
            return Err(invalid("cleaner_interval_secs", "must be at most one year"));
        }
        if !is_cookie_token(&self.cookie_name) {
            return Err(invalid(
                "cookie_name",
                "must be a non-empty token without separators",
            ));
        }
        if http::HeaderName::from_bytes(self.session_header.as_bytes()).is_err() {
            return Err(invalid("session_header", "must be a valid HTTP header name"));
        }

        let domain = self.domain.filter(|d| !d.is_empty());
        let path = if self.cookie_path.is_empty() {
            "/".to_string()
        } else {
            self.cookie_path
        };

        Ok(SessionConfig {
            cleaner_interval: Duration::from_secs(self.cleaner_interval_secs),
            max_lifetime: Duration::from_secs(self.max_lifetime_secs),
            enable_http_header: self.enable_http_header,
            session_header: self.session_header,
            auto_refresh: self.auto_refresh,
            cookie: CookieSettings {
                name: self.cookie_name,
                domain,
                path,
                secure: self.secure,
                http_only: self.http_only,
                lifetime: Duration::from_secs(self.cookie_lifetime_secs),
            },
        })
    }
}

/// Load and validate session configuration from a file.
///
/// Files ending in `.json` are parsed as JSON, everything else as TOML.
pub fn load_config_file(path: &Path) -> Result<SessionConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let section = if is_json {
        SessionSection::from_json(&contents)?
    } else {
        SessionSection::from_toml(&contents)?
    };

    section.into_config()
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// RFC 6265 cookie-name token check.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')'
                        | b'<'
                        | b'>'
                        | b'@'
                        | b','
                        | b';'
                        | b':'
                        | b'\\'
                        | b'"'
                        | b'/'
                        | b'['
                        | b']'
                        | b'?'
                        | b'='
                        | b'{'
                        | b'}'
                )
        })
}

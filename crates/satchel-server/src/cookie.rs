//! `Set-Cookie` values for session identifiers.

use axum::http::HeaderValue;
use satchel_session::CookieSettings;

use crate::error::{Result, ServerError};

/// Build the `Set-Cookie` value that hands `id` to the client.
pub fn session_cookie(settings: &CookieSettings, id: &str) -> Result<HeaderValue> {
    let max_age = (!settings.lifetime.is_zero()).then(|| settings.lifetime.as_secs());
    build(settings, &urlencoding::encode(id), max_age)
}

/// Build a `Set-Cookie` value that makes the client drop its session cookie.
pub fn expired_cookie(settings: &CookieSettings) -> Result<HeaderValue> {
    build(settings, "", Some(0))
}

fn build(settings: &CookieSettings, value: &str, max_age: Option<u64>) -> Result<HeaderValue> {
    let mut cookie = format!("{}={}; Path={}", settings.name, value, settings.path);
    if let Some(domain) = &settings.domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    if let Some(secs) = max_age {
        cookie.push_str(&format!("; Max-Age={secs}"));
    }
    if settings.secure {
        cookie.push_str("; Secure");
    }
    if settings.http_only {
        cookie.push_str("; HttpOnly");
    }
    cookie.push_str("; SameSite=Lax");

    HeaderValue::from_str(&cookie)
        .map_err(|e| ServerError::Internal(format!("invalid Set-Cookie value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_cookie() {
        let value = session_cookie(&CookieSettings::default(), "abc-123").unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "sessionid=abc-123; Path=/; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn test_all_attributes() {
        let settings = CookieSettings {
            name: "sid".to_string(),
            domain: Some("example.com".to_string()),
            path: "/app".to_string(),
            secure: true,
            http_only: false,
            lifetime: Duration::from_secs(3600),
        };
        let value = session_cookie(&settings, "a b").unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "sid=a%20b; Path=/app; Domain=example.com; Max-Age=3600; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn test_expired_cookie() {
        let value = expired_cookie(&CookieSettings::default()).unwrap();
        assert!(value.to_str().unwrap().starts_with("sessionid=; Path=/; Max-Age=0"));
    }
}

//! Session identifier extraction from request headers.
//!
//! Resolution order, applied by [`SessionRegistry::extract_id`]:
//!
//! 1. The configured cookie. A present, non-empty value must query-unescape
//!    cleanly, otherwise extraction fails with
//!    [`Error::IdentifierMalformed`] and the header is *not* consulted.
//! 2. The configured header, only when header extraction is enabled and the
//!    cookie is absent or empty.
//! 3. [`Error::IdentifierNotFound`].

use std::hash::Hash;

use http::HeaderMap;
use http::header::COOKIE;
use tracing::trace;

use crate::error::{Error, Result};
use crate::registry::SessionRegistry;

impl<K, V> SessionRegistry<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Resolve the session identifier for a request.
    pub fn extract_id(&self, headers: &HeaderMap) -> Result<String> {
        match cookie_value(headers, &self.config().cookie.name) {
            Some(raw) if !raw.is_empty() => query_unescape(raw),
            _ if self.config().enable_http_header => self.extract_id_from_header(headers),
            _ => Err(Error::IdentifierNotFound),
        }
    }

    /// Resolve the identifier from the session cookie only.
    pub fn extract_id_from_cookie(&self, headers: &HeaderMap) -> Result<String> {
        match cookie_value(headers, &self.config().cookie.name) {
            Some(raw) if !raw.is_empty() => query_unescape(raw),
            _ => Err(Error::IdentifierNotFound),
        }
    }

    /// Resolve the identifier from the session header only.
    ///
    /// Fails when header extraction is disabled, the header is missing or
    /// its first value is empty.
    pub fn extract_id_from_header(&self, headers: &HeaderMap) -> Result<String> {
        if !self.config().enable_http_header {
            return Err(Error::IdentifierNotFound);
        }

        let value = headers
            .get(self.config().session_header.as_str())
            .ok_or(Error::IdentifierNotFound)?;
        if value.is_empty() {
            return Err(Error::IdentifierNotFound);
        }

        let id = value
            .to_str()
            .map_err(|_| Error::IdentifierMalformed("non-ASCII header value".to_string()))?;
        trace!(header = %self.config().session_header, "Session id taken from header");
        Ok(id.to_string())
    }
}

/// Find the raw value of the first well-formed cookie called `name`.
///
/// Every `Cookie` header is searched in order. Surrounding double quotes are
/// stripped; pairs with characters outside the RFC 6265 cookie-octet set are
/// skipped.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            if key.trim() != name {
                return None;
            }
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            value.bytes().all(is_cookie_octet).then_some(value)
        })
        .next()
}

fn is_cookie_octet(b: u8) -> bool {
    (0x21..0x7f).contains(&b) && b != b'"' && b != b';' && b != b'\\'
}

/// Query-unescape a cookie value: `+` is a space, `%XX` needs two hex
/// digits and the decoded bytes must be UTF-8.
fn query_unescape(raw: &str) -> Result<String> {
    let bytes = raw.as_bytes();
    let well_formed = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !well_formed {
        return Err(Error::IdentifierMalformed(format!(
            "invalid escape in '{raw}'"
        )));
    }

    urlencoding::decode(&raw.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::IdentifierMalformed(format!("'{raw}' does not decode to UTF-8")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use http::HeaderValue;

    fn registry(config: SessionConfig) -> SessionRegistry {
        SessionRegistry::new(config)
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_cookie_value_lookup() {
        let h = headers(&[("cookie", "theme=dark; sessionid=abc123; other=1")]);
        assert_eq!(cookie_value(&h, "sessionid"), Some("abc123"));
        assert_eq!(cookie_value(&h, "missing"), None);
    }

    #[test]
    fn test_cookie_value_across_headers_and_quotes() {
        let h = headers(&[("cookie", "theme=dark"), ("cookie", "sessionid=\"quoted\"")]);
        assert_eq!(cookie_value(&h, "sessionid"), Some("quoted"));
    }

    #[test]
    fn test_cookie_value_skips_invalid_octets() {
        let h = headers(&[("cookie", "sessionid=a\\b; sessionid=good")]);
        assert_eq!(cookie_value(&h, "sessionid"), Some("good"));
    }

    #[test]
    fn test_query_unescape() {
        assert_eq!(query_unescape("abc").unwrap(), "abc");
        assert_eq!(query_unescape("a%20b+c").unwrap(), "a b c");
        assert_eq!(query_unescape("a%2Bb").unwrap(), "a+b");
        assert!(matches!(
            query_unescape("bad%zz"),
            Err(Error::IdentifierMalformed(_))
        ));
        assert!(matches!(
            query_unescape("trailing%4"),
            Err(Error::IdentifierMalformed(_))
        ));
        assert!(matches!(
            query_unescape("%ff%fe"),
            Err(Error::IdentifierMalformed(_))
        ));
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let reg = registry(SessionConfig::new().with_http_header("X-Session-Id"));
        let h = headers(&[("cookie", "sessionid=from-cookie"), ("x-session-id", "from-header")]);
        assert_eq!(reg.extract_id(&h).unwrap(), "from-cookie");
    }

    #[test]
    fn test_header_used_when_cookie_absent() {
        let reg = registry(SessionConfig::new().with_http_header("X-Session-Id"));
        let h = headers(&[("x-session-id", "from-header")]);
        assert_eq!(reg.extract_id(&h).unwrap(), "from-header");
    }

    #[test]
    fn test_header_used_when_cookie_empty() {
        let reg = registry(SessionConfig::new().with_http_header("X-Session-Id"));
        let h = headers(&[("cookie", "sessionid="), ("x-session-id", "from-header")]);
        assert_eq!(reg.extract_id(&h).unwrap(), "from-header");
    }

    #[test]
    fn test_header_ignored_when_disabled() {
        let reg = registry(SessionConfig::new());
        let h = headers(&[("x-session-id", "from-header")]);
        assert_eq!(reg.extract_id(&h), Err(Error::IdentifierNotFound));
        assert_eq!(reg.extract_id_from_header(&h), Err(Error::IdentifierNotFound));
    }

    #[test]
    fn test_malformed_cookie_does_not_fall_through() {
        let reg = registry(SessionConfig::new().with_http_header("X-Session-Id"));
        let h = headers(&[("cookie", "sessionid=bad%zz"), ("x-session-id", "from-header")]);
        assert!(matches!(
            reg.extract_id(&h),
            Err(Error::IdentifierMalformed(_))
        ));
    }

    #[test]
    fn test_cookie_is_unescaped() {
        let reg = registry(SessionConfig::new());
        let h = headers(&[("cookie", "sessionid=a%2Fb%3D")]);
        assert_eq!(reg.extract_id_from_cookie(&h).unwrap(), "a/b=");
    }

    #[test]
    fn test_custom_cookie_name() {
        let reg = registry(SessionConfig::new().with_cookie_name("sid"));
        let h = headers(&[("cookie", "sessionid=wrong; sid=right")]);
        assert_eq!(reg.extract_id(&h).unwrap(), "right");
    }

    #[test]
    fn test_empty_header_value() {
        let reg = registry(SessionConfig::new().with_http_header("X-Session-Id"));
        let h = headers(&[("x-session-id", "")]);
        assert_eq!(reg.extract_id_from_header(&h), Err(Error::IdentifierNotFound));
    }

    #[test]
    fn test_nothing_present() {
        let reg = registry(SessionConfig::new().with_http_header("X-Session-Id"));
        assert_eq!(reg.extract_id(&HeaderMap::new()), Err(Error::IdentifierNotFound));
        assert_eq!(
            reg.extract_id_from_cookie(&HeaderMap::new()),
            Err(Error::IdentifierNotFound)
        );
    }
}

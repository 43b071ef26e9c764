/// Credential cookies
///
/// Both tokens can be delivered as cookies next to the JSON body. Cookies
/// are `HttpOnly`, `SameSite=Lax`, scoped to `/`, and `Secure` in
/// production.
///
/// Lifetimes are configured separately from token lifetimes. The defaults
/// reproduce the legacy values byte-for-byte: 9000 seconds for the access
/// cookie and 6,048,000 seconds for the refresh cookie. The access cookie
/// therefore expires after 2.5 hours even though the token inside it is
/// valid for 8.

use axum::http::{header, HeaderMap};

/// Cookie carrying the access token
pub const ACCESS_COOKIE: &str = "accessToken";

/// Cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Legacy access cookie lifetime in seconds
pub const DEFAULT_ACCESS_COOKIE_MAX_AGE: i64 = 9_000;

/// Legacy refresh cookie lifetime in seconds
pub const DEFAULT_REFRESH_COOKIE_MAX_AGE: i64 = 6_048_000;

/// Attributes applied to credential cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub secure: bool,
    pub access_max_age: i64,
    pub refresh_max_age: i64,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            secure: false,
            access_max_age: DEFAULT_ACCESS_COOKIE_MAX_AGE,
            refresh_max_age: DEFAULT_REFRESH_COOKIE_MAX_AGE,
        }
    }
}

impl CookiePolicy {
    fn build(&self, name: &str, value: &str, max_age: i64) -> String {
        let mut cookie = format!("{name}={value}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Lax");
        if max_age == 0 {
            cookie.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value for the access token
    pub fn access_cookie(&self, token: &str) -> String {
        self.build(ACCESS_COOKIE, token, self.access_max_age)
    }

    /// `Set-Cookie` value for the refresh token
    pub fn refresh_cookie(&self, token: &str) -> String {
        self.build(REFRESH_COOKIE, token, self.refresh_max_age)
    }

    /// `Set-Cookie` values that make the client drop both credentials
    pub fn clear_cookies(&self) -> [String; 2] {
        [
            self.build(ACCESS_COOKIE, "", 0),
            self.build(REFRESH_COOKIE, "", 0),
        ]
    }
}

/// Reads a cookie value from the request's `Cookie` headers
///
/// Empty values count as absent.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_default_max_ages_match_legacy_values() {
        let policy = CookiePolicy::default();
        assert_eq!(policy.access_max_age, 10_000 * 60 * 15 / 1000);
        assert_eq!(policy.refresh_max_age, 10_000 * 60 * 60 * 24 * 7 / 1000);
    }

    #[test]
    fn test_access_cookie_attributes() {
        let cookie = CookiePolicy::default().access_cookie("abc");
        assert_eq!(
            cookie,
            "accessToken=abc; Max-Age=9000; Path=/; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn test_secure_in_production() {
        let policy = CookiePolicy {
            secure: true,
            ..Default::default()
        };
        assert!(policy.refresh_cookie("r").ends_with("; Secure"));
        assert!(policy.refresh_cookie("r").contains("Max-Age=6048000"));
    }

    #[test]
    fn test_clear_cookies_expire_immediately() {
        let [access, refresh] = CookiePolicy::default().clear_cookies();
        assert!(access.starts_with("accessToken=; Max-Age=0"));
        assert!(refresh.starts_with("refreshToken=; Max-Age=0"));
        assert!(access.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=tok.en.value"),
        );
        headers.append(header::COOKIE, HeaderValue::from_static("refreshToken="));

        assert_eq!(read_cookie(&headers, ACCESS_COOKIE), Some("tok.en.value"));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE), None);
        assert_eq!(read_cookie(&headers, "missing"), None);
    }
}

use axum::http::{header, HeaderMap};

pub const SESSION_COOKIE: &str = "fc_session";
pub const REFRESH_COOKIE: &str = "fc_refresh";
pub const IMPERSONATION_COOKIE: &str = "fc_impersonate";

/// Attributes shared by every cookie the service sets
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

impl CookieSettings {
    /// Build a `Set-Cookie` value scoped to the whole site.
    ///
    /// `http_only = false` leaves the value readable by client scripts.
    pub fn build(&self, name: &str, value: &str, max_age_secs: i64, http_only: bool) -> String {
        let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age_secs}; SameSite=Lax");
        if http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn clear(&self, name: &str, http_only: bool) -> String {
        self.build(name, "", 0, http_only)
    }
}

/// Find a cookie value across every `Cookie` header of the request
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
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
    fn reads_cookie_from_any_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; fc_session=abc.def; b=2"));

        assert_eq!(read_cookie(&headers, SESSION_COOKIE), Some("abc.def"));
        assert_eq!(read_cookie(&headers, "theme"), Some("dark"));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE), None);
    }

    #[test]
    fn empty_cookie_reads_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("fc_impersonate="));
        assert_eq!(read_cookie(&headers, IMPERSONATION_COOKIE), None);
    }

    #[test]
    fn secure_flag_follows_settings() {
        let plain = CookieSettings { secure: false }.build("x", "1", 60, true);
        assert_eq!(plain, "x=1; Path=/; Max-Age=60; SameSite=Lax; HttpOnly");

        let secure = CookieSettings { secure: true }.clear("x", false);
        assert_eq!(secure, "x=; Path=/; Max-Age=0; SameSite=Lax; Secure");
    }
}

//! Minimal cookie reading and Set-Cookie construction.
//!
//! Only what the redirect path needs: reading named values from the `Cookie`
//! header and producing `Set-Cookie` strings for the visitor, analytics, and
//! password-gate cookies.

use axum::http::{HeaderMap, header};

/// Seconds in one day.
pub const DAY: i64 = 24 * 60 * 60;

/// Reads a named cookie from the request headers.
pub fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Parses the whole `Cookie` header into a name → value map.
pub fn cookie_map(headers: &HeaderMap) -> std::collections::HashMap<String, String> {
    let Some(raw) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) else {
        return Default::default();
    };

    raw.split(';')
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Builds a `Set-Cookie` header value.
///
/// Cookies are scoped to the whole site, `SameSite=Lax` so they survive the
/// cross-site navigations that short links exist for.
pub fn build_set_cookie(name: &str, value: &str, max_age_secs: i64, http_only: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age_secs}; SameSite=Lax");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    cookie
}

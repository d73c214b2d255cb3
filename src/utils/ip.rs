//! Client IP extraction with proxy-header support.

use axum::http::HeaderMap;
use std::net::IpAddr;
use std::str::FromStr;

/// Proxy headers checked in order of trustworthiness.
const IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-real-ip", "x-forwarded-for"];

/// Resolves the client IP address.
///
/// When `trust_proxy_headers` is set (service behind a trusted reverse
/// proxy), forwarding headers are consulted first; `X-Forwarded-For` may
/// carry a comma-separated chain, of which the first valid address wins.
/// Falls back to the peer socket address. Returns `None` when nothing
/// parses as an IP — callers treat an unresolvable IP conservatively.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trust_proxy_headers: bool,
) -> Option<String> {
    if trust_proxy_headers {
        for header in IP_HEADERS {
            let Some(value) = headers.get(*header).and_then(|v| v.to_str().ok()) else {
                continue;
            };
            for candidate in value.split(',') {
                if let Ok(ip) = IpAddr::from_str(candidate.trim()) {
                    return Some(ip.to_string());
                }
            }
        }
    }

    peer.map(|ip| ip.to_string())
}

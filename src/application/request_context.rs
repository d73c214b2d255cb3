//! Per-request facts extracted once by the HTTP layer.

use std::collections::HashMap;

/// Roles that may view draft/private/future links.
const EDIT_ROLES: &[&str] = &["administrator", "editor"];

/// Everything the redirect pipeline needs to know about the inbound request.
///
/// Built once per request by the handler; the services below it never touch
/// raw HTTP types.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Resolved client IP, already filtered through the proxy-header chain.
    /// `None` when nothing parsed as an address.
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    /// Edge-provided country header (`CF-IPCountry`), if any.
    pub country_header: Option<String>,
    pub cookies: HashMap<String, String>,
    /// Roles of the authenticated caller; empty for anonymous visitors.
    pub roles: Vec<String>,
    /// Raw query string of the inbound request, used for parameter forwarding.
    pub query: Option<String>,
}

impl RequestContext {
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// True when the caller may access restricted (draft/private/future) links.
    pub fn can_edit(&self) -> bool {
        self.roles
            .iter()
            .any(|role| EDIT_ROLES.contains(&role.as_str()))
    }
}

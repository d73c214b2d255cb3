//! Click entity: an immutable analytics event recorded per eligible redirect.

use chrono::{DateTime, Utc};

/// A recorded click. Append-only; never mutated after insert.
///
/// Optional fields reflect the tracking toggles active when the click was
/// recorded — a click written with IP tracking off simply has no `ip_address`.
#[derive(Debug, Clone, PartialEq)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
    pub click_date: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub referring_url: String,
    pub user_agent: Option<String>,
    pub visitor_id: Option<String>,
    /// The resolved URL actually redirected to, after rule matching.
    pub destination_url: String,
}

/// Input for recording a new click. The timestamp is set by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClick {
    pub link_id: i64,
    pub ip_address: Option<String>,
    pub referring_url: String,
    pub user_agent: Option<String>,
    pub visitor_id: Option<String>,
    pub destination_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_click_with_all_fields() {
        let new_click = NewClick {
            link_id: 42,
            ip_address: Some("203.0.113.9".to_string()),
            referring_url: "https://blog.example.com/post".to_string(),
            user_agent: Some("Mozilla/5.0".to_string()),
            visitor_id: Some("d3b07384-d9a0-4f5c-8f2e-1c2d3e4f5a6b".to_string()),
            destination_url: "https://example.com/landing".to_string(),
        };

        assert_eq!(new_click.link_id, 42);
        assert!(new_click.ip_address.is_some());
        assert!(new_click.visitor_id.is_some());
    }

    #[test]
    fn test_new_click_minimal() {
        let new_click = NewClick {
            link_id: 7,
            ip_address: None,
            referring_url: String::new(),
            user_agent: None,
            visitor_id: None,
            destination_url: "https://example.com".to_string(),
        };

        assert!(new_click.ip_address.is_none());
        assert!(new_click.user_agent.is_none());
        assert!(new_click.referring_url.is_empty());
    }
}

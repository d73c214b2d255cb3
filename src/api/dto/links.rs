//! DTOs for the link management endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{
    FlagSetting, Link, LinkPatch, LinkStatus, NewLink, RedirectCode, Rule,
};
use crate::error::AppError;
use serde_json::json;

/// Sentinel accepted in `redirection_type` fields meaning "inherit the
/// global default".
const INHERIT_REDIRECT: u16 = 0;

/// Request to create a link.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Omit for a link that redirects to the placeholder until edited.
    #[validate(url(message = "Invalid destination URL"))]
    pub destination_url: Option<String>,

    /// Omit to get a generated slug.
    pub slug: Option<String>,

    pub status: Option<LinkStatus>,
    pub password: Option<String>,
    #[validate(length(max = 2000))]
    pub note: Option<String>,

    pub nofollow: Option<FlagSetting>,
    pub sponsored: Option<FlagSetting>,
    /// 301, 302, 307, or 0 to inherit the global default.
    pub redirection_type: Option<u16>,
    pub parameter_forwarding: Option<FlagSetting>,

    #[serde(default)]
    pub dynamic_rules: Vec<Rule>,
}

impl CreateLinkRequest {
    pub fn into_new_link(self) -> Result<NewLink, AppError> {
        Ok(NewLink {
            slug: self.slug.unwrap_or_default(),
            destination_url: self.destination_url.unwrap_or_default(),
            status: self.status.unwrap_or(LinkStatus::Published),
            password: self.password.filter(|p| !p.is_empty()),
            note: self.note.filter(|n| !n.is_empty()),
            nofollow: self.nofollow.unwrap_or_default(),
            sponsored: self.sponsored.unwrap_or_default(),
            redirection_type: parse_redirect_code(self.redirection_type)?,
            parameter_forwarding: self.parameter_forwarding.unwrap_or_default(),
            dynamic_rules: self.dynamic_rules,
        })
    }
}

/// Request to partially update a link.
///
/// Absent fields are unchanged. An empty string clears `password`/`note`;
/// `redirection_type: 0` reverts to the global default.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    pub slug: Option<String>,
    #[validate(url(message = "Invalid destination URL"))]
    pub destination_url: Option<String>,
    pub status: Option<LinkStatus>,
    pub password: Option<String>,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
    pub nofollow: Option<FlagSetting>,
    pub sponsored: Option<FlagSetting>,
    pub redirection_type: Option<u16>,
    pub parameter_forwarding: Option<FlagSetting>,
    pub dynamic_rules: Option<Vec<Rule>>,
}

impl UpdateLinkRequest {
    pub fn into_patch(self) -> Result<LinkPatch, AppError> {
        Ok(LinkPatch {
            slug: self.slug,
            destination_url: self.destination_url,
            status: self.status,
            password: self.password.map(|p| (!p.is_empty()).then_some(p)),
            note: self.note.map(|n| (!n.is_empty()).then_some(n)),
            nofollow: self.nofollow,
            sponsored: self.sponsored,
            redirection_type: match self.redirection_type {
                None => None,
                Some(code) => Some(parse_redirect_code(Some(code))?),
            },
            parameter_forwarding: self.parameter_forwarding,
            dynamic_rules: self.dynamic_rules,
        })
    }
}

fn parse_redirect_code(code: Option<u16>) -> Result<Option<RedirectCode>, AppError> {
    match code {
        None | Some(INHERIT_REDIRECT) => Ok(None),
        Some(code) => RedirectCode::from_u16(code).map(Some).ok_or_else(|| {
            AppError::bad_request(
                "redirection_type must be 301, 302, 307, or 0 to inherit",
                json!({ "redirection_type": code }),
            )
        }),
    }
}

/// Query parameters for the link listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListLinksQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<LinkStatus>,
}

/// Query parameters for the delete endpoint.
#[derive(Debug, Deserialize)]
pub struct DeleteLinkQuery {
    #[serde(default)]
    pub permanent: bool,
}

/// Serialized link returned by the API. The password itself never leaves
/// the server; only its presence does.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub slug: String,
    pub destination_url: String,
    pub status: LinkStatus,
    pub has_password: bool,
    pub note: Option<String>,
    pub nofollow: FlagSetting,
    pub sponsored: FlagSetting,
    pub redirection_type: Option<u16>,
    pub parameter_forwarding: FlagSetting,
    pub dynamic_rules: Vec<Rule>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            slug: link.slug,
            destination_url: link.destination_url,
            status: link.status,
            has_password: link.password.as_deref().is_some_and(|p| !p.is_empty()),
            note: link.note,
            nofollow: link.nofollow,
            sponsored: link.sponsored,
            redirection_type: link.redirection_type.map(|c| c.as_u16()),
            parameter_forwarding: link.parameter_forwarding,
            dynamic_rules: link.dynamic_rules,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

/// Paginated link listing.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub items: Vec<LinkResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let request: CreateLinkRequest = serde_json::from_value(json!({
            "destination_url": "https://example.com"
        }))
        .unwrap();

        let new_link = request.into_new_link().unwrap();
        assert_eq!(new_link.status, LinkStatus::Published);
        assert_eq!(new_link.nofollow, FlagSetting::Inherit);
        assert!(new_link.slug.is_empty());
        assert!(new_link.redirection_type.is_none());
    }

    #[test]
    fn test_redirect_code_zero_means_inherit() {
        assert_eq!(parse_redirect_code(Some(0)).unwrap(), None);
        assert_eq!(
            parse_redirect_code(Some(301)).unwrap(),
            Some(RedirectCode::MovedPermanently)
        );
        assert!(parse_redirect_code(Some(308)).is_err());
    }

    #[test]
    fn test_update_empty_password_clears_it() {
        let request: UpdateLinkRequest = serde_json::from_value(json!({
            "password": ""
        }))
        .unwrap();

        let patch = request.into_patch().unwrap();
        assert_eq!(patch.password, Some(None));
        assert!(patch.note.is_none());
    }

    #[test]
    fn test_link_response_hides_password() {
        let link = Link {
            id: 1,
            slug: "promo".to_string(),
            destination_url: "https://example.com".to_string(),
            status: LinkStatus::Published,
            password: Some("hunter2".to_string()),
            note: None,
            nofollow: FlagSetting::Inherit,
            sponsored: FlagSetting::Inherit,
            redirection_type: Some(RedirectCode::Found),
            parameter_forwarding: FlagSetting::Inherit,
            dynamic_rules: vec![],
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let response = LinkResponse::from(link);
        assert!(response.has_password);
        assert_eq!(response.redirection_type, Some(302));

        let body = serde_json::to_string(&response).unwrap();
        assert!(!body.contains("hunter2"));
    }
}

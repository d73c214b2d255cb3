//! Link entity: a short slug mapped to a destination URL with redirect attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::rule::Rule;

/// Destination used when a link was saved without one. A link must never
/// redirect to an empty URL.
pub const PLACEHOLDER_DESTINATION: &str = "about:blank";

/// Publication state of a link.
///
/// `Draft`, `Private` and `Future` links resolve only for callers with edit
/// capability; `Trashed` links do not resolve at all and free their slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Published,
    Draft,
    Private,
    Future,
    Trashed,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Draft => "draft",
            Self::Private => "private",
            Self::Future => "future",
            Self::Trashed => "trashed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "published" => Some(Self::Published),
            "draft" => Some(Self::Draft),
            "private" => Some(Self::Private),
            "future" => Some(Self::Future),
            "trashed" => Some(Self::Trashed),
            _ => None,
        }
    }
}

/// Tri-state attribute that can defer to the global default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSetting {
    Inherit,
    On,
    Off,
}

impl FlagSetting {
    /// Resolves the flag against the global default.
    pub fn resolve(&self, global: bool) -> bool {
        match self {
            Self::Inherit => global,
            Self::On => true,
            Self::Off => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inherit => "inherit",
            Self::On => "on",
            Self::Off => "off",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inherit" => Some(Self::Inherit),
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

impl Default for FlagSetting {
    fn default() -> Self {
        Self::Inherit
    }
}

/// HTTP status code used for the redirect response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum RedirectCode {
    MovedPermanently,
    Found,
    TemporaryRedirect,
}

impl RedirectCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::MovedPermanently => 301,
            Self::Found => 302,
            Self::TemporaryRedirect => 307,
        }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            301 => Some(Self::MovedPermanently),
            302 => Some(Self::Found),
            307 => Some(Self::TemporaryRedirect),
            _ => None,
        }
    }
}

impl From<RedirectCode> for u16 {
    fn from(code: RedirectCode) -> u16 {
        code.as_u16()
    }
}

impl TryFrom<u16> for RedirectCode {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::from_u16(code).ok_or_else(|| format!("unsupported redirect code: {code}"))
    }
}

/// A short link with its redirect attributes and dynamic rules.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: i64,
    pub slug: String,
    pub destination_url: String,
    pub status: LinkStatus,
    pub password: Option<String>,
    pub note: Option<String>,
    pub nofollow: FlagSetting,
    pub sponsored: FlagSetting,
    /// `None` inherits the global redirection type.
    pub redirection_type: Option<RedirectCode>,
    pub parameter_forwarding: FlagSetting,
    pub dynamic_rules: Vec<Rule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// Returns true if the link resolves only for callers with edit capability.
    pub fn is_restricted(&self) -> bool {
        matches!(
            self.status,
            LinkStatus::Draft | LinkStatus::Private | LinkStatus::Future
        )
    }

    pub fn is_trashed(&self) -> bool {
        self.status == LinkStatus::Trashed
    }

    /// Returns true if access is gated by a password.
    pub fn requires_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Static destination with the empty-URL fallback applied.
    pub fn static_destination(&self) -> &str {
        if self.destination_url.is_empty() {
            PLACEHOLDER_DESTINATION
        } else {
            &self.destination_url
        }
    }
}

/// Input for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub slug: String,
    pub destination_url: String,
    pub status: LinkStatus,
    pub password: Option<String>,
    pub note: Option<String>,
    pub nofollow: FlagSetting,
    pub sponsored: FlagSetting,
    pub redirection_type: Option<RedirectCode>,
    pub parameter_forwarding: FlagSetting,
    pub dynamic_rules: Vec<Rule>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged. `password: Some(None)` clears the
/// password; `Some(Some(p))` sets it. Same for `note` and `redirection_type`.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub slug: Option<String>,
    pub destination_url: Option<String>,
    pub status: Option<LinkStatus>,
    pub password: Option<Option<String>>,
    pub note: Option<Option<String>>,
    pub nofollow: Option<FlagSetting>,
    pub sponsored: Option<FlagSetting>,
    pub redirection_type: Option<Option<RedirectCode>>,
    pub parameter_forwarding: Option<FlagSetting>,
    pub dynamic_rules: Option<Vec<Rule>>,
}

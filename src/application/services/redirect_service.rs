//! Redirection dispatcher: slug lookup, access checks, rule matching, click
//! tracking, and the final redirect decision.

use std::sync::Arc;

use chrono::Local;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::warn;

use crate::application::request_context::RequestContext;
use crate::application::services::click_service::ClickService;
use crate::domain::entities::{Link, RedirectCode, Settings};
use crate::domain::repositories::LinkRepository;
use crate::domain::rules::{self, RuleContext};
use crate::error::AppError;
use crate::infrastructure::geo::GeoProvider;
use crate::utils::cookies::{DAY, build_set_cookie};
use crate::utils::user_agent::classify_device;

type HmacSha256 = Hmac<Sha256>;

/// How long a successful password verification stays valid for a browser.
const POSTPASS_COOKIE_MAX_AGE: i64 = 10 * DAY;

/// Terminal decision for one redirect request.
#[derive(Debug)]
pub enum RedirectOutcome {
    /// Issue an HTTP redirect.
    Redirect {
        destination: String,
        status: RedirectCode,
        /// `Set-Cookie` values accumulated along the way (visitor id,
        /// analytics client id).
        set_cookies: Vec<String>,
    },
    /// Render the password challenge form instead of redirecting.
    PasswordChallenge { slug: String, failed: bool },
}

/// The entry point of the redirect pipeline.
pub struct RedirectService {
    links: Arc<dyn LinkRepository>,
    clicks: Arc<ClickService>,
    geo: Arc<dyn GeoProvider>,
    signing_secret: String,
    public_base_url: String,
    url_prefix: String,
}

impl RedirectService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        clicks: Arc<ClickService>,
        geo: Arc<dyn GeoProvider>,
        signing_secret: String,
        public_base_url: String,
        url_prefix: String,
    ) -> Self {
        Self {
            links,
            clicks,
            geo,
            signing_secret,
            public_base_url,
            url_prefix,
        }
    }

    /// Resolves one inbound `GET /{prefix}/{slug}` request.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] — no live link carries the slug
    /// - [`AppError::Forbidden`] — restricted link, caller lacks edit
    ///   capability; rendered as a 404 so existence does not leak
    ///
    /// Click-recording failures never surface here: they are logged and the
    /// redirect proceeds.
    pub async fn resolve(
        &self,
        slug: &str,
        ctx: &RequestContext,
        settings: &Settings,
    ) -> Result<RedirectOutcome, AppError> {
        let link = self
            .links
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "slug": slug })))?;

        if link.is_restricted() && !ctx.can_edit() {
            return Err(AppError::forbidden(
                "Link is not publicly accessible",
                json!({ "slug": slug, "status": link.status.as_str() }),
            ));
        }

        if link.requires_password() && !self.password_verified(&link, ctx) {
            return Ok(RedirectOutcome::PasswordChallenge {
                slug: slug.to_string(),
                failed: false,
            });
        }

        let mut destination = self.resolve_destination(&link, ctx, settings).await;

        if settings.effective_parameter_forwarding(&link) {
            destination = forward_query_params(&destination, ctx.query.as_deref());
        }

        let public_link_url = self.public_link_url(&link.slug);
        let set_cookies = match self
            .clicks
            .track(&link, &destination, &public_link_url, ctx, settings)
            .await
        {
            Ok(outcome) => outcome.set_cookies,
            Err(e) => {
                warn!(slug, "click recording failed, redirecting anyway: {e}");
                Vec::new()
            }
        };

        Ok(RedirectOutcome::Redirect {
            destination,
            status: settings.effective_redirect_code(&link),
            set_cookies,
        })
    }

    /// Loads a link for the password flow, applying the same visibility
    /// checks as [`Self::resolve`].
    pub async fn accessible_link(
        &self,
        slug: &str,
        ctx: &RequestContext,
    ) -> Result<Link, AppError> {
        let link = self
            .links
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "slug": slug })))?;

        if link.is_restricted() && !ctx.can_edit() {
            return Err(AppError::forbidden(
                "Link is not publicly accessible",
                json!({ "slug": slug }),
            ));
        }

        Ok(link)
    }

    /// Checks a submitted password. On success returns the `Set-Cookie`
    /// value that marks this browser as verified for the link.
    pub fn verify_password(&self, link: &Link, supplied: &str) -> Option<String> {
        let expected = link.password.as_deref()?;
        if supplied != expected {
            return None;
        }

        let mac = self.postpass_mac(link)?;
        Some(build_set_cookie(
            &postpass_cookie_name(link),
            &mac,
            POSTPASS_COOKIE_MAX_AGE,
            true,
        ))
    }

    fn password_verified(&self, link: &Link, ctx: &RequestContext) -> bool {
        let Some(expected) = self.postpass_mac(link) else {
            return false;
        };
        ctx.cookie(&postpass_cookie_name(link)) == Some(expected.as_str())
    }

    /// MAC binding the link id to its current password. Changing the password
    /// invalidates every previously-issued cookie.
    fn postpass_mac(&self, link: &Link) -> Option<String> {
        let password = link.password.as_deref()?;
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(format!("{}:{}", link.id, password).as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    async fn resolve_destination(
        &self,
        link: &Link,
        ctx: &RequestContext,
        settings: &Settings,
    ) -> String {
        if link.dynamic_rules.is_empty() {
            return link.static_destination().to_string();
        }

        // The context is assembled once per request; the matcher itself is a
        // pure function of rules + context.
        let now = Local::now();
        let rule_ctx = RuleContext {
            country: self
                .geo
                .country(settings.geolocation_service, ctx)
                .await,
            device: classify_device(ctx.user_agent.as_deref().unwrap_or("")),
            date: now.date_naive(),
            time: now.time(),
        };

        rules::resolve_destination(&link.dynamic_rules, &rule_ctx)
            .map(str::to_string)
            .unwrap_or_else(|| link.static_destination().to_string())
    }

    /// The public short URL, reported to the analytics endpoint.
    fn public_link_url(&self, slug: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.url_prefix,
            slug
        )
    }
}

/// Cookie marking a browser as password-verified for one link.
pub fn postpass_cookie_name(link: &Link) -> String {
    format!("lc_postpass_{}", link.id)
}

/// Merges the inbound query string into the destination URL.
///
/// Existing destination parameters are kept; inbound ones are appended. An
/// unparseable destination is returned unchanged.
fn forward_query_params(destination: &str, query: Option<&str>) -> String {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return destination.to_string();
    };

    let Ok(mut url) = url::Url::parse(destination) else {
        return destination.to_string();
    };

    let incoming: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    if incoming.is_empty() {
        return destination.to_string();
    }

    url.query_pairs_mut().extend_pairs(incoming);
    url.to_string()
}

//! Handlers for short-link resolution: the redirect itself and the password
//! challenge flow.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    body::Body,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::net::SocketAddr;
use tracing::debug;

use crate::application::RequestContext;
use crate::application::services::RedirectOutcome;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::cookies::cookie_map;
use crate::utils::ip::client_ip;

/// The password challenge page, self-submitting back to the slug path.
#[derive(Template, WebTemplate)]
#[template(path = "password_form.html")]
struct PasswordFormTemplate {
    prefix: String,
    slug: String,
    failed: bool,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    password: String,
}

/// Resolves a short slug and issues the redirect.
///
/// # Endpoint
///
/// `GET /{prefix}/{slug}`
///
/// # Request Flow
///
/// 1. Assemble the request context (IP, cookies, UA, optional bearer role)
/// 2. Fetch the settings snapshot for this request
/// 3. Delegate the whole decision to the redirect service
/// 4. Render the outcome: redirect, password form, or 404
///
/// # Errors
///
/// Returns 404 both for unknown slugs and for restricted links the caller
/// may not see.
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let ctx = build_request_context(&state, &headers, addr, uri.query()).await;
    let settings = state.settings_service.current().await?;

    match state.redirect_service.resolve(&slug, &ctx, &settings).await? {
        RedirectOutcome::Redirect {
            destination,
            status,
            set_cookies,
        } => redirect_response(&destination, status.as_u16(), &set_cookies),
        RedirectOutcome::PasswordChallenge { slug, failed } => Ok(PasswordFormTemplate {
            prefix: state.url_prefix.clone(),
            slug,
            failed,
        }
        .into_response()),
    }
}

/// Verifies a submitted link password.
///
/// # Endpoint
///
/// `POST /{prefix}/{slug}`
///
/// On success, sets the verification cookie and redirects back to the GET
/// path so the normal pipeline (rules, tracking) runs; on failure the form
/// is re-rendered with an error.
pub async fn password_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    let ctx = build_request_context(&state, &headers, addr, None).await;
    let link = state.redirect_service.accessible_link(&slug, &ctx).await?;

    let back_to_link = format!("/{}/{}", state.url_prefix, slug);

    if !link.requires_password() {
        return redirect_response(&back_to_link, 302, &[]);
    }

    match state.redirect_service.verify_password(&link, &form.password) {
        Some(set_cookie) => redirect_response(&back_to_link, 302, &[set_cookie]),
        None => Ok(PasswordFormTemplate {
            prefix: state.url_prefix.clone(),
            slug,
            failed: true,
        }
        .into_response()),
    }
}

/// Builds the per-request context the services operate on.
///
/// A present-but-invalid bearer token downgrades to anonymous rather than
/// failing: the redirect path is public.
async fn build_request_context(
    state: &AppState,
    headers: &HeaderMap,
    addr: SocketAddr,
    query: Option<&str>,
) -> RequestContext {
    let roles = match bearer_token(headers) {
        Some(token) => match state.auth_service.authenticate(&token).await {
            Ok(auth) => vec![auth.role],
            Err(e) => {
                debug!("ignoring invalid bearer token on redirect path: {e}");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    RequestContext {
        ip: client_ip(headers, Some(addr.ip()), state.behind_proxy),
        user_agent: header_string(headers, header::USER_AGENT.as_str()),
        referrer: header_string(headers, header::REFERER.as_str()),
        country_header: header_string(headers, "cf-ipcountry"),
        cookies: cookie_map(headers),
        roles,
        query: query.map(str::to_string),
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn redirect_response(
    destination: &str,
    status: u16,
    set_cookies: &[String],
) -> Result<Response, AppError> {
    let mut builder = Response::builder()
        .status(StatusCode::from_u16(status).unwrap_or(StatusCode::TEMPORARY_REDIRECT))
        .header(header::LOCATION, destination);

    for cookie in set_cookies {
        builder = builder.header(header::SET_COOKIE, cookie);
    }

    builder.body(Body::empty()).map_err(|e| {
        AppError::internal(
            "Failed to build redirect response",
            serde_json::json!({ "reason": e.to_string() }),
        )
    })
}

//! Slug generation and validation.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Random bytes per generated slug, before base64 encoding.
const SLUG_LENGTH_BYTES: usize = 9;

/// Slugs reserved for system routes.
const RESERVED_SLUGS: &[&str] = &["api", "health", "admin", "static", "assets", "login"];

/// Generates a random 12-character URL-safe slug.
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
pub fn generate_slug() -> String {
    let mut buffer = [0u8; SLUG_LENGTH_BYTES];

    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer)
}

/// Validates a user-chosen slug.
///
/// # Rules
///
/// - Length: 3-64 characters
/// - Allowed characters: lowercase letters, digits, hyphens
/// - Cannot start or end with a hyphen
/// - Cannot collide with a reserved system route
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_slug(slug: &str) -> Result<(), AppError> {
    if slug.len() < 3 || slug.len() > 64 {
        return Err(AppError::bad_request(
            "Slug must be 3-64 characters",
            json!({ "provided_length": slug.len() }),
        ));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::bad_request(
            "Slug can only contain lowercase letters, digits, and hyphens",
            json!({ "slug": slug }),
        ));
    }

    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(AppError::bad_request(
            "Slug cannot start or end with a hyphen",
            json!({ "slug": slug }),
        ));
    }

    if RESERVED_SLUGS.contains(&slug) {
        return Err(AppError::bad_request(
            "This slug is reserved",
            json!({ "slug": slug }),
        ));
    }

    Ok(())
}

//! Repository trait for short-link data access.

use async_trait::async_trait;

use crate::domain::entities::{Link, LinkPatch, LinkStatus, NewLink};
use crate::error::AppError;

/// Repository interface for managing short links.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slug is already used by a
    /// non-trashed link. Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by slug across every status except `trashed`.
    ///
    /// The redirect path needs draft/private/future links too — they produce
    /// a not-accessible response rather than a plain 404.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError>;

    /// Finds a link by its id, including trashed links.
    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Lists links ordered by creation time, newest first.
    async fn list(
        &self,
        page: i64,
        page_size: i64,
        status: Option<LinkStatus>,
    ) -> Result<Vec<Link>, AppError>;

    /// Counts links, optionally filtered by status.
    async fn count(&self, status: Option<LinkStatus>) -> Result<i64, AppError>;

    /// Partially updates a link. `None` fields in the patch are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches `id`.
    /// Returns [`AppError::Conflict`] when a slug rename collides.
    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Link, AppError>;

    /// Sets the status of a link (used for trash and restore).
    ///
    /// Returns `Ok(true)` when a row was updated.
    async fn set_status(&self, id: i64, status: LinkStatus) -> Result<bool, AppError>;

    /// Permanently deletes a link row. Click cleanup is the caller's concern.
    ///
    /// Returns `Ok(true)` when a row was deleted.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

//! Link creation, retrieval, and lifecycle management.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domain::entities::{Link, LinkPatch, LinkStatus, NewLink, Settings};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;
use crate::utils::slug::{generate_slug, validate_custom_slug};

/// Attempts before giving up on generating a collision-free slug.
const MAX_SLUG_ATTEMPTS: usize = 10;

/// Service for managing short links.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    clicks: Arc<dyn ClickRepository>,
}

impl LinkService {
    pub fn new(links: Arc<dyn LinkRepository>, clicks: Arc<dyn ClickRepository>) -> Self {
        Self { links, clicks }
    }

    /// Creates a link.
    ///
    /// A custom slug is validated and checked for collision against live
    /// (non-trashed) links; without one, a random 12-character slug is
    /// generated with collision retry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an invalid destination URL or
    /// slug, [`AppError::Conflict`] when the slug is taken.
    pub async fn create_link(&self, mut new_link: NewLink) -> Result<Link, AppError> {
        validate_destination(&new_link.destination_url)?;

        if new_link.slug.is_empty() {
            new_link.slug = self.generate_unique_slug().await?;
        } else {
            validate_custom_slug(&new_link.slug)?;

            if self.links.find_by_slug(&new_link.slug).await?.is_some() {
                return Err(AppError::conflict(
                    "Slug already exists",
                    json!({ "slug": new_link.slug }),
                ));
            }
        }

        let link = self.links.create(new_link).await?;
        info!(slug = %link.slug, link_id = link.id, "link created");
        Ok(link)
    }

    /// Retrieves a live link by slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no non-trashed link matches.
    pub async fn get_link(&self, slug: &str) -> Result<Link, AppError> {
        self.links
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "slug": slug })))
    }

    /// Lists links with pagination and an optional status filter.
    pub async fn list_links(
        &self,
        page: i64,
        page_size: i64,
        status: Option<LinkStatus>,
    ) -> Result<(Vec<Link>, i64), AppError> {
        let items = self.links.list(page, page_size, status).await?;
        let total = self.links.count(status).await?;
        Ok((items, total))
    }

    /// Applies a partial update to a live link.
    ///
    /// A slug rename is validated and collision-checked the same way as at
    /// creation; rules are replaced wholesale when present in the patch.
    pub async fn update_link(&self, slug: &str, patch: LinkPatch) -> Result<Link, AppError> {
        let link = self.get_link(slug).await?;

        if let Some(new_destination) = &patch.destination_url {
            validate_destination(new_destination)?;
        }

        if let Some(new_slug) = &patch.slug
            && new_slug != &link.slug
        {
            validate_custom_slug(new_slug)?;

            if self.links.find_by_slug(new_slug).await?.is_some() {
                return Err(AppError::conflict(
                    "Slug already exists",
                    json!({ "slug": new_slug }),
                ));
            }
        }

        self.links.update(link.id, patch).await
    }

    /// Moves a live link to the trash, freeing its slug.
    pub async fn trash_link(&self, slug: &str) -> Result<(), AppError> {
        let link = self.get_link(slug).await?;
        self.links.set_status(link.id, LinkStatus::Trashed).await?;
        info!(slug, link_id = link.id, "link trashed");
        Ok(())
    }

    /// Restores a trashed link as a draft.
    ///
    /// Restoring to draft rather than the previous status avoids silently
    /// re-publishing, and sidesteps slug collisions with links created in
    /// the meantime becoming public.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown id,
    /// [`AppError::Validation`] when the link is not trashed.
    pub async fn restore_link(&self, id: i64) -> Result<Link, AppError> {
        let link = self
            .links
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        if !link.is_trashed() {
            return Err(AppError::bad_request(
                "Link is not in the trash",
                json!({ "id": id, "status": link.status.as_str() }),
            ));
        }

        self.links.set_status(id, LinkStatus::Draft).await?;
        self.links
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))
    }

    /// Permanently deletes a link by id.
    ///
    /// When the `delete_tracking_data_on_link_deletion` setting is on, the
    /// link's clicks are removed too; otherwise they stay orphaned.
    pub async fn delete_link_permanently(
        &self,
        id: i64,
        settings: &Settings,
    ) -> Result<(), AppError> {
        let deleted = self.links.delete(id).await?;
        if !deleted {
            return Err(AppError::not_found("Link not found", json!({ "id": id })));
        }

        if settings.delete_tracking_data_on_link_deletion {
            let removed = self.clicks.delete_for_link(id).await?;
            info!(link_id = id, removed, "link and tracking data deleted");
        } else {
            info!(link_id = id, "link deleted, tracking data retained");
        }

        Ok(())
    }

    async fn generate_unique_slug(&self) -> Result<String, AppError> {
        for _ in 0..MAX_SLUG_ATTEMPTS {
            let slug = generate_slug();

            if self.links.find_by_slug(&slug).await?.is_none() {
                return Ok(slug);
            }
        }

        Err(AppError::internal(
            "Failed to generate unique slug",
            json!({ "reason": "Too many collisions" }),
        ))
    }
}

/// An empty destination is stored as-is (the redirect falls back to the
/// placeholder); a non-empty one must be an absolute URL.
fn validate_destination(destination: &str) -> Result<(), AppError> {
    if destination.is_empty() {
        return Ok(());
    }

    url::Url::parse(destination).map_err(|e| {
        AppError::bad_request(
            "Invalid destination URL",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(())
}

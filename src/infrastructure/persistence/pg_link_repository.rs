//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;

use crate::domain::entities::{
    FlagSetting, Link, LinkPatch, LinkStatus, NewLink, RedirectCode, Rule,
};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, slug, destination_url, status, password, note, nofollow, \
     sponsored, redirection_type, parameter_forwarding, dynamic_rules, created_at, updated_at";

/// Raw row shape; parsed into the domain [`Link`] with fallbacks so one
/// corrupt row degrades instead of breaking the whole query.
#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    slug: String,
    destination_url: String,
    status: String,
    password: Option<String>,
    note: Option<String>,
    nofollow: String,
    sponsored: String,
    redirection_type: Option<i16>,
    parameter_forwarding: String,
    dynamic_rules: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LinkRow {
    fn into_link(self) -> Link {
        let status = LinkStatus::parse(&self.status).unwrap_or_else(|| {
            warn!(link_id = self.id, "unknown link status {:?}", self.status);
            // An unrecognized status must not make a link public.
            LinkStatus::Draft
        });

        let dynamic_rules: Vec<Rule> =
            serde_json::from_value(self.dynamic_rules).unwrap_or_else(|e| {
                warn!(link_id = self.id, "unparseable dynamic rules: {e}");
                Vec::new()
            });

        Link {
            id: self.id,
            slug: self.slug,
            destination_url: self.destination_url,
            status,
            password: self.password,
            note: self.note,
            nofollow: FlagSetting::parse(&self.nofollow).unwrap_or_default(),
            sponsored: FlagSetting::parse(&self.sponsored).unwrap_or_default(),
            redirection_type: self
                .redirection_type
                .and_then(|code| RedirectCode::from_u16(code as u16)),
            parameter_forwarding: FlagSetting::parse(&self.parameter_forwarding)
                .unwrap_or_default(),
            dynamic_rules,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn rules_to_json(rules: &[Rule]) -> serde_json::Value {
    serde_json::to_value(rules).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}

/// PostgreSQL repository for link storage and retrieval.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let query = format!(
            "INSERT INTO links (slug, destination_url, status, password, note, nofollow, \
             sponsored, redirection_type, parameter_forwarding, dynamic_rules) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {LINK_COLUMNS}"
        );

        let row: LinkRow = sqlx::query_as(&query)
            .bind(&new_link.slug)
            .bind(&new_link.destination_url)
            .bind(new_link.status.as_str())
            .bind(&new_link.password)
            .bind(&new_link.note)
            .bind(new_link.nofollow.as_str())
            .bind(new_link.sponsored.as_str())
            .bind(new_link.redirection_type.map(|c| c.as_u16() as i16))
            .bind(new_link.parameter_forwarding.as_str())
            .bind(rules_to_json(&new_link.dynamic_rules))
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into_link())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        let query =
            format!("SELECT {LINK_COLUMNS} FROM links WHERE slug = $1 AND status <> 'trashed'");

        let row: Option<LinkRow> = sqlx::query_as(&query)
            .bind(slug)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(LinkRow::into_link))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let query = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1");

        let row: Option<LinkRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(LinkRow::into_link))
    }

    async fn list(
        &self,
        page: i64,
        page_size: i64,
        status: Option<LinkStatus>,
    ) -> Result<Vec<Link>, AppError> {
        let offset = (page - 1).max(0) * page_size;
        let query = format!(
            "SELECT {LINK_COLUMNS} FROM links \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );

        let rows: Vec<LinkRow> = sqlx::query_as(&query)
            .bind(status.map(|s| s.as_str()))
            .bind(page_size)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(LinkRow::into_link).collect())
    }

    async fn count(&self, status: Option<LinkStatus>) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE ($1::text IS NULL OR status = $1)")
                .bind(status.map(|s| s.as_str()))
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Link, AppError> {
        // Fields wrapped twice (e.g. password) carry an explicit "set this
        // field, possibly to NULL" flag alongside the value.
        let query = format!(
            "UPDATE links SET \
               slug = COALESCE($2, slug), \
               destination_url = COALESCE($3, destination_url), \
               status = COALESCE($4, status), \
               password = CASE WHEN $5 THEN $6 ELSE password END, \
               note = CASE WHEN $7 THEN $8 ELSE note END, \
               nofollow = COALESCE($9, nofollow), \
               sponsored = COALESCE($10, sponsored), \
               redirection_type = CASE WHEN $11 THEN $12 ELSE redirection_type END, \
               parameter_forwarding = COALESCE($13, parameter_forwarding), \
               dynamic_rules = COALESCE($14, dynamic_rules), \
               updated_at = now() \
             WHERE id = $1 \
             RETURNING {LINK_COLUMNS}"
        );

        let row: Option<LinkRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(&patch.slug)
            .bind(&patch.destination_url)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.password.is_some())
            .bind(patch.password.flatten())
            .bind(patch.note.is_some())
            .bind(patch.note.flatten())
            .bind(patch.nofollow.map(|f| f.as_str()))
            .bind(patch.sponsored.map(|f| f.as_str()))
            .bind(patch.redirection_type.is_some())
            .bind(
                patch
                    .redirection_type
                    .flatten()
                    .map(|c| c.as_u16() as i16),
            )
            .bind(patch.parameter_forwarding.map(|f| f.as_str()))
            .bind(patch.dynamic_rules.as_deref().map(rules_to_json))
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(LinkRow::into_link).ok_or_else(|| {
            AppError::not_found("Link not found", serde_json::json!({ "id": id }))
        })
    }

    async fn set_status(&self, id: i64, status: LinkStatus) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE links SET status = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(self.pool.as_ref())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

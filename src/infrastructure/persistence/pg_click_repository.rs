//! PostgreSQL implementation of the click repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Click, NewClick};
use crate::domain::repositories::{ClickPage, ClickRepository, DailyClicks, LinkTotals};
use crate::error::AppError;

const CLICK_COLUMNS: &str =
    "id, link_id, click_date, ip_address, referring_url, user_agent, visitor_id, destination_url";

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    link_id: i64,
    click_date: DateTime<Utc>,
    ip_address: Option<String>,
    referring_url: String,
    user_agent: Option<String>,
    visitor_id: Option<String>,
    destination_url: String,
}

impl From<ClickRow> for Click {
    fn from(row: ClickRow) -> Self {
        Click {
            id: row.id,
            link_id: row.link_id,
            click_date: row.click_date,
            ip_address: row.ip_address,
            referring_url: row.referring_url,
            user_agent: row.user_agent,
            visitor_id: row.visitor_id,
            destination_url: row.destination_url,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DailyRow {
    date: NaiveDate,
    clicks: i64,
    unique_visitors: i64,
}

#[derive(sqlx::FromRow)]
struct TotalsRow {
    link_id: i64,
    slug: String,
    destination_url: String,
    total_clicks: i64,
    unique_clicks: i64,
}

/// PostgreSQL repository for the append-only click table.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record(&self, new_click: NewClick) -> Result<Click, AppError> {
        let query = format!(
            "INSERT INTO clicks (link_id, ip_address, referring_url, user_agent, visitor_id, \
             destination_url) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CLICK_COLUMNS}"
        );

        let row: ClickRow = sqlx::query_as(&query)
            .bind(new_click.link_id)
            .bind(&new_click.ip_address)
            .bind(&new_click.referring_url)
            .bind(&new_click.user_agent)
            .bind(&new_click.visitor_id)
            .bind(&new_click.destination_url)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn timeseries(
        &self,
        link_id: Option<i64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyClicks>, AppError> {
        let rows: Vec<DailyRow> = sqlx::query_as(
            "SELECT click_date::date AS date, \
                    COUNT(*) AS clicks, \
                    COUNT(DISTINCT visitor_id) AS unique_visitors \
             FROM clicks \
             WHERE ($1::bigint IS NULL OR link_id = $1) \
               AND click_date::date BETWEEN $2 AND $3 \
             GROUP BY click_date::date \
             ORDER BY date",
        )
        .bind(link_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DailyClicks {
                date: r.date,
                clicks: r.clicks,
                unique_visitors: r.unique_visitors,
            })
            .collect())
    }

    async fn top_links(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LinkTotals>, AppError> {
        let rows: Vec<TotalsRow> = sqlx::query_as(
            "SELECT l.id AS link_id, l.slug, l.destination_url, \
                    COUNT(c.id) AS total_clicks, \
                    COUNT(DISTINCT c.visitor_id) AS unique_clicks \
             FROM links l \
             JOIN clicks c ON c.link_id = l.id \
             WHERE ($1::timestamptz IS NULL OR c.click_date >= $1) \
               AND ($2::timestamptz IS NULL OR c.click_date <= $2) \
             GROUP BY l.id, l.slug, l.destination_url \
             ORDER BY total_clicks DESC, l.id \
             LIMIT $3 OFFSET $4",
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LinkTotals {
                link_id: r.link_id,
                slug: r.slug,
                destination_url: r.destination_url,
                total_clicks: r.total_clicks,
                unique_clicks: r.unique_clicks,
            })
            .collect())
    }

    async fn recent(
        &self,
        link_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<ClickPage, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM clicks WHERE ($1::bigint IS NULL OR link_id = $1)",
        )
        .bind(link_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        let query = format!(
            "SELECT {CLICK_COLUMNS} FROM clicks \
             WHERE ($1::bigint IS NULL OR link_id = $1) \
             ORDER BY click_date DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );

        let rows: Vec<ClickRow> = sqlx::query_as(&query)
            .bind(link_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(ClickPage {
            total,
            items: rows.into_iter().map(Click::from).collect(),
        })
    }

    async fn count_for_link(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM clicks \
             WHERE link_id = $1 \
               AND ($2::timestamptz IS NULL OR click_date >= $2) \
               AND ($3::timestamptz IS NULL OR click_date <= $3)",
        )
        .bind(link_id)
        .bind(from)
        .bind(to)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn delete_for_link(&self, link_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM clicks WHERE link_id = $1")
            .bind(link_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM clicks WHERE click_date < $1")
            .bind(cutoff)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}

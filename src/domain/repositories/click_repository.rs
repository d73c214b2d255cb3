//! Repository trait for click recording and analytics queries.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::entities::{Click, NewClick};
use crate::error::AppError;

/// One day of aggregated click counts.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyClicks {
    pub date: NaiveDate,
    pub clicks: i64,
    /// Distinct visitor ids seen that day; zero when visitor tracking is off.
    pub unique_visitors: i64,
}

/// Aggregated totals for one link, used by the leaderboard view.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTotals {
    pub link_id: i64,
    pub slug: String,
    pub destination_url: String,
    pub total_clicks: i64,
    pub unique_clicks: i64,
}

/// A page of individual click rows plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct ClickPage {
    pub total: i64,
    pub items: Vec<Click>,
}

/// Repository interface for the append-only click table.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Inserts one click row. Single atomic append, no update path.
    async fn record(&self, new_click: NewClick) -> Result<Click, AppError>;

    /// Per-day click counts between `from` and `to` (inclusive), optionally
    /// scoped to one link. Days without clicks are absent from the result.
    async fn timeseries(
        &self,
        link_id: Option<i64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyClicks>, AppError>;

    /// Links ordered by total clicks within the optional date range.
    async fn top_links(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LinkTotals>, AppError>;

    /// Newest-first click rows, optionally scoped to one link.
    async fn recent(
        &self,
        link_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<ClickPage, AppError>;

    /// Click count for a link within an optional date range.
    async fn count_for_link(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError>;

    /// Deletes every click belonging to a link. Used when a link is
    /// permanently deleted with tracking-data cleanup enabled.
    async fn delete_for_link(&self, link_id: i64) -> Result<u64, AppError>;

    /// Deletes clicks older than `cutoff`; returns the number removed.
    /// This is the storage half of the retention contract — scheduling is
    /// the housekeeping task's concern.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}

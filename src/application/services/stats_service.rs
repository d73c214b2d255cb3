//! Read-side click analytics: time series, leaderboard, recent clicks.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;

use crate::domain::repositories::{ClickPage, ClickRepository, DailyClicks, LinkTotals};
use crate::error::AppError;

/// Hard cap on page sizes for the analytics endpoints.
const MAX_PAGE_SIZE: i64 = 100;

/// Service answering the insights queries over recorded clicks.
pub struct StatsService {
    clicks: Arc<dyn ClickRepository>,
}

impl StatsService {
    pub fn new(clicks: Arc<dyn ClickRepository>) -> Self {
        Self { clicks }
    }

    /// Per-day click and unique-visitor counts for a date range, optionally
    /// scoped to one link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when `from` is after `to`.
    pub async fn timeseries(
        &self,
        link_id: Option<i64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyClicks>, AppError> {
        if from > to {
            return Err(AppError::bad_request(
                "Date range start is after its end",
                json!({ "from": from.to_string(), "to": to.to_string() }),
            ));
        }

        self.clicks.timeseries(link_id, from, to).await
    }

    /// Most-clicked links within the optional date range.
    pub async fn top_links(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LinkTotals>, AppError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = offset.max(0);

        self.clicks.top_links(from, to, limit, offset).await
    }

    /// Newest-first click rows for the recent-activity view.
    pub async fn recent_clicks(
        &self,
        link_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<ClickPage, AppError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = offset.max(0);

        self.clicks.recent(link_id, offset, limit).await
    }

    /// Total clicks for one link within an optional date range.
    pub async fn count_clicks(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        self.clicks.count_for_link(link_id, from, to).await
    }
}

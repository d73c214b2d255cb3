//! DTOs for the insights endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::Click;
use crate::domain::repositories::{DailyClicks, LinkTotals};

/// Query for the per-day time series.
#[derive(Debug, Deserialize)]
pub struct TimeseriesQuery {
    pub link_id: Option<i64>,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// One day in the time series.
#[derive(Debug, Serialize)]
pub struct TimeseriesPoint {
    pub date: NaiveDate,
    pub clicks: i64,
    pub unique_visitors: i64,
}

impl From<DailyClicks> for TimeseriesPoint {
    fn from(d: DailyClicks) -> Self {
        Self {
            date: d.date,
            clicks: d.clicks,
            unique_visitors: d.unique_visitors,
        }
    }
}

/// Query for the most-clicked-links leaderboard.
#[derive(Debug, Deserialize)]
pub struct TopLinksQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One leaderboard row.
#[derive(Debug, Serialize)]
pub struct TopLinkEntry {
    pub link_id: i64,
    pub slug: String,
    pub destination_url: String,
    pub total_clicks: i64,
    pub unique_clicks: i64,
}

impl From<LinkTotals> for TopLinkEntry {
    fn from(t: LinkTotals) -> Self {
        Self {
            link_id: t.link_id,
            slug: t.slug,
            destination_url: t.destination_url,
            total_clicks: t.total_clicks,
            unique_clicks: t.unique_clicks,
        }
    }
}

/// Query for the recent-clicks view.
#[derive(Debug, Deserialize)]
pub struct RecentClicksQuery {
    pub link_id: Option<i64>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// One recorded click as returned by the API.
#[derive(Debug, Serialize)]
pub struct ClickEntry {
    pub id: i64,
    pub link_id: i64,
    pub click_date: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub referring_url: String,
    pub user_agent: Option<String>,
    pub visitor_id: Option<String>,
    pub destination_url: String,
}

impl From<Click> for ClickEntry {
    fn from(c: Click) -> Self {
        Self {
            id: c.id,
            link_id: c.link_id,
            click_date: c.click_date,
            ip_address: c.ip_address,
            referring_url: c.referring_url,
            user_agent: c.user_agent,
            visitor_id: c.visitor_id,
            destination_url: c.destination_url,
        }
    }
}

/// Paginated recent-clicks response.
#[derive(Debug, Serialize)]
pub struct RecentClicksResponse {
    pub total: i64,
    pub items: Vec<ClickEntry>,
}

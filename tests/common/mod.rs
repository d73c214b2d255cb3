#![allow(dead_code)]

//! Shared scaffolding for integration tests: in-memory repository fakes and
//! an `AppState` builder, so the HTTP flows run without external services.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::mpsc;

use linkcentral::AppError;
use linkcentral::application::services::{
    AuthService, ClickService, LinkService, RedirectService, SettingsService, StatsService,
};
use linkcentral::domain::analytics_event::AnalyticsEvent;
use linkcentral::domain::entities::{
    Click, FlagSetting, Link, LinkPatch, LinkStatus, NewClick, NewLink, Settings,
};
use linkcentral::domain::repositories::{
    ClickPage, ClickRepository, DailyClicks, LinkRepository, LinkTotals, SettingsRepository,
    TokenRecord, TokenRepository,
};
use linkcentral::infrastructure::geo::GeoResolver;
use linkcentral::infrastructure::keyvalue::MemoryTtlStore;
use linkcentral::state::AppState;

pub const SIGNING_SECRET: &str = "integration-test-secret";
pub const URL_PREFIX: &str = "go";

// ── In-memory link repository ──────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryLinkRepository {
    links: Mutex<Vec<Link>>,
    next_id: AtomicI64,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self {
            links: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn all(&self) -> Vec<Link> {
        self.links.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();

        if links
            .iter()
            .any(|l| l.slug == new_link.slug && l.status != LinkStatus::Trashed)
        {
            return Err(AppError::conflict(
                "Slug already exists",
                serde_json::json!({ "slug": new_link.slug }),
            ));
        }

        let link = Link {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            slug: new_link.slug,
            destination_url: new_link.destination_url,
            status: new_link.status,
            password: new_link.password,
            note: new_link.note,
            nofollow: new_link.nofollow,
            sponsored: new_link.sponsored,
            redirection_type: new_link.redirection_type,
            parameter_forwarding: new_link.parameter_forwarding,
            dynamic_rules: new_link.dynamic_rules,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        links.push(link.clone());
        Ok(link)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.slug == slug && l.status != LinkStatus::Trashed)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn list(
        &self,
        page: i64,
        page_size: i64,
        status: Option<LinkStatus>,
    ) -> Result<Vec<Link>, AppError> {
        let mut links: Vec<Link> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();

        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = ((page - 1).max(0) * page_size) as usize;
        Ok(links
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect())
    }

    async fn count(&self, status: Option<LinkStatus>) -> Result<i64, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| status.is_none_or(|s| l.status == s))
            .count() as i64)
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();
        let link = links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| AppError::not_found("Link not found", serde_json::json!({ "id": id })))?;

        if let Some(slug) = patch.slug {
            link.slug = slug;
        }
        if let Some(destination_url) = patch.destination_url {
            link.destination_url = destination_url;
        }
        if let Some(status) = patch.status {
            link.status = status;
        }
        if let Some(password) = patch.password {
            link.password = password;
        }
        if let Some(note) = patch.note {
            link.note = note;
        }
        if let Some(nofollow) = patch.nofollow {
            link.nofollow = nofollow;
        }
        if let Some(sponsored) = patch.sponsored {
            link.sponsored = sponsored;
        }
        if let Some(redirection_type) = patch.redirection_type {
            link.redirection_type = redirection_type;
        }
        if let Some(parameter_forwarding) = patch.parameter_forwarding {
            link.parameter_forwarding = parameter_forwarding;
        }
        if let Some(dynamic_rules) = patch.dynamic_rules {
            link.dynamic_rules = dynamic_rules;
        }
        link.updated_at = Utc::now();

        Ok(link.clone())
    }

    async fn set_status(&self, id: i64, status: LinkStatus) -> Result<bool, AppError> {
        let mut links = self.links.lock().unwrap();
        match links.iter_mut().find(|l| l.id == id) {
            Some(link) => {
                link.status = status;
                link.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| l.id != id);
        Ok(links.len() < before)
    }
}

// ── In-memory click repository ─────────────────────────────────────────────

pub struct MemoryClickRepository {
    clicks: Mutex<Vec<Click>>,
    next_id: AtomicI64,
    links: Arc<MemoryLinkRepository>,
}

impl MemoryClickRepository {
    pub fn new(links: Arc<MemoryLinkRepository>) -> Self {
        Self {
            clicks: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            links,
        }
    }

    pub fn all(&self) -> Vec<Click> {
        self.clicks.lock().unwrap().clone()
    }

    /// Inserts a click row directly, bypassing eligibility (test seeding).
    pub fn seed(&self, link_id: i64, click_date: DateTime<Utc>, visitor_id: Option<&str>) {
        let mut clicks = self.clicks.lock().unwrap();
        clicks.push(Click {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            link_id,
            click_date,
            ip_address: Some("203.0.113.7".to_string()),
            referring_url: String::new(),
            user_agent: None,
            visitor_id: visitor_id.map(str::to_string),
            destination_url: "https://example.com".to_string(),
        });
    }
}

#[async_trait]
impl ClickRepository for MemoryClickRepository {
    async fn record(&self, new_click: NewClick) -> Result<Click, AppError> {
        let mut clicks = self.clicks.lock().unwrap();
        let click = Click {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            link_id: new_click.link_id,
            click_date: Utc::now(),
            ip_address: new_click.ip_address,
            referring_url: new_click.referring_url,
            user_agent: new_click.user_agent,
            visitor_id: new_click.visitor_id,
            destination_url: new_click.destination_url,
        };
        clicks.push(click.clone());
        Ok(click)
    }

    async fn timeseries(
        &self,
        link_id: Option<i64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyClicks>, AppError> {
        let clicks = self.clicks.lock().unwrap();

        let mut by_day: HashMap<NaiveDate, (i64, std::collections::HashSet<String>)> =
            HashMap::new();

        for click in clicks.iter() {
            if link_id.is_some_and(|id| click.link_id != id) {
                continue;
            }
            let date = click.click_date.date_naive();
            if date < from || date > to {
                continue;
            }
            let entry = by_day.entry(date).or_default();
            entry.0 += 1;
            if let Some(visitor) = &click.visitor_id {
                entry.1.insert(visitor.clone());
            }
        }

        let mut series: Vec<DailyClicks> = by_day
            .into_iter()
            .map(|(date, (clicks, visitors))| DailyClicks {
                date,
                clicks,
                unique_visitors: visitors.len() as i64,
            })
            .collect();
        series.sort_by_key(|d| d.date);
        Ok(series)
    }

    async fn top_links(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LinkTotals>, AppError> {
        let clicks = self.clicks.lock().unwrap();

        let mut by_link: HashMap<i64, (i64, std::collections::HashSet<String>)> = HashMap::new();
        for click in clicks.iter() {
            if from.is_some_and(|f| click.click_date < f)
                || to.is_some_and(|t| click.click_date > t)
            {
                continue;
            }
            let entry = by_link.entry(click.link_id).or_default();
            entry.0 += 1;
            if let Some(visitor) = &click.visitor_id {
                entry.1.insert(visitor.clone());
            }
        }

        let links = self.links.all();
        let mut totals: Vec<LinkTotals> = by_link
            .into_iter()
            .filter_map(|(link_id, (total, visitors))| {
                let link = links.iter().find(|l| l.id == link_id)?;
                Some(LinkTotals {
                    link_id,
                    slug: link.slug.clone(),
                    destination_url: link.destination_url.clone(),
                    total_clicks: total,
                    unique_clicks: visitors.len() as i64,
                })
            })
            .collect();

        totals.sort_by(|a, b| b.total_clicks.cmp(&a.total_clicks).then(a.link_id.cmp(&b.link_id)));
        Ok(totals
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn recent(
        &self,
        link_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<ClickPage, AppError> {
        let clicks = self.clicks.lock().unwrap();

        let mut matching: Vec<Click> = clicks
            .iter()
            .filter(|c| link_id.is_none_or(|id| c.link_id == id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.click_date.cmp(&a.click_date).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok(ClickPage { total, items })
    }

    async fn count_for_link(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        Ok(self
            .clicks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.link_id == link_id)
            .filter(|c| !from.is_some_and(|f| c.click_date < f))
            .filter(|c| !to.is_some_and(|t| c.click_date > t))
            .count() as i64)
    }

    async fn delete_for_link(&self, link_id: i64) -> Result<u64, AppError> {
        let mut clicks = self.clicks.lock().unwrap();
        let before = clicks.len();
        clicks.retain(|c| c.link_id != link_id);
        Ok((before - clicks.len()) as u64)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let mut clicks = self.clicks.lock().unwrap();
        let before = clicks.len();
        clicks.retain(|c| c.click_date >= cutoff);
        Ok((before - clicks.len()) as u64)
    }
}

// ── In-memory settings and token repositories ──────────────────────────────

#[derive(Default)]
pub struct MemorySettingsRepository {
    settings: Mutex<Settings>,
}

#[async_trait]
impl SettingsRepository for MemorySettingsRepository {
    async fn load(&self) -> Result<Settings, AppError> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), AppError> {
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryTokenRepository {
    tokens: Mutex<Vec<TokenRecord>>,
    next_id: AtomicI64,
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn create(
        &self,
        name: &str,
        token_hash: &str,
        role: &str,
    ) -> Result<TokenRecord, AppError> {
        let mut tokens = self.tokens.lock().unwrap();
        let record = TokenRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            role: role.to_string(),
            revoked: false,
            created_at: Utc::now(),
            last_used_at: None,
        };
        tokens.push(record.clone());
        Ok(record)
    }

    async fn find_active_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<TokenRecord>, AppError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token_hash == token_hash && !t.revoked)
            .cloned())
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.token_hash == token_hash) {
            token.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<TokenRecord>, AppError> {
        Ok(self.tokens.lock().unwrap().clone())
    }

    async fn revoke(&self, name: &str) -> Result<bool, AppError> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.iter_mut().find(|t| t.name == name) {
            Some(token) => {
                token.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ── State builder ──────────────────────────────────────────────────────────

/// Handles kept by tests for seeding data and asserting on writes.
pub struct TestHandles {
    pub links: Arc<MemoryLinkRepository>,
    pub clicks: Arc<MemoryClickRepository>,
    pub analytics_rx: mpsc::Receiver<AnalyticsEvent>,
}

pub fn create_test_state() -> (AppState, TestHandles) {
    let links = Arc::new(MemoryLinkRepository::new());
    let clicks = Arc::new(MemoryClickRepository::new(links.clone()));
    let markers = Arc::new(MemoryTtlStore::new());
    let (analytics_tx, analytics_rx) = mpsc::channel(100);

    let settings_service = Arc::new(SettingsService::new(Arc::new(
        MemorySettingsRepository::default(),
    )));
    let click_service = Arc::new(ClickService::new(
        clicks.clone(),
        markers.clone(),
        analytics_tx.clone(),
    ));
    let redirect_service = Arc::new(RedirectService::new(
        links.clone(),
        click_service,
        Arc::new(GeoResolver::new()),
        SIGNING_SECRET.to_string(),
        "https://short.example.com".to_string(),
        URL_PREFIX.to_string(),
    ));
    let link_service = Arc::new(LinkService::new(links.clone(), clicks.clone()));
    let stats_service = Arc::new(StatsService::new(clicks.clone()));
    let auth_service = Arc::new(AuthService::new(
        Arc::new(MemoryTokenRepository::default()),
        SIGNING_SECRET.to_string(),
    ));

    let state = AppState {
        link_service,
        redirect_service,
        stats_service,
        settings_service,
        auth_service,
        markers,
        analytics_tx,
        behind_proxy: false,
        url_prefix: URL_PREFIX.to_string(),
    };

    let handles = TestHandles {
        links,
        clicks,
        analytics_rx,
    };

    (state, handles)
}

/// Seeds a published link and returns it.
pub async fn seed_link(handles: &TestHandles, slug: &str, destination: &str) -> Link {
    seed_link_with(handles, slug, destination, |_| {}).await
}

/// Seeds a link after applying `customize` to the default template.
pub async fn seed_link_with(
    handles: &TestHandles,
    slug: &str,
    destination: &str,
    customize: impl FnOnce(&mut NewLink),
) -> Link {
    let mut new_link = NewLink {
        slug: slug.to_string(),
        destination_url: destination.to_string(),
        status: LinkStatus::Published,
        password: None,
        note: None,
        nofollow: FlagSetting::Inherit,
        sponsored: FlagSetting::Inherit,
        redirection_type: None,
        parameter_forwarding: FlagSetting::Inherit,
        dynamic_rules: vec![],
    };
    customize(&mut new_link);

    handles.links.create(new_link).await.unwrap()
}

// ── ConnectInfo injection for TestServer ───────────────────────────────────

/// Injects a fixed peer address so extractors relying on `ConnectInfo` work
/// under `axum_test::TestServer`.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> tower::Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "198.51.100.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

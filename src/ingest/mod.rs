// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::config::PodcastConfig;
use crate::ingest::providers::{
    alpha_vantage::AlphaVantageProvider, gnews::GNewsProvider, newsapi::NewsApiProvider,
    nytimes::NyTimesProvider, weather::WeatherProvider,
};
use crate::ingest::types::{HeadlineItem, SourceData, SourceKind, SourceProvider, Snapshot};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "source_fetch_errors_total",
            "Source fetches that failed and were replaced by empty data."
        );
        describe_counter!("source_items_total", "Items returned by source fetches.");
    });
}

/// Whatever the five sources produced for one request. Empty means "failed or nothing".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBundle {
    pub gnews: Vec<HeadlineItem>,
    pub newsapi: Vec<HeadlineItem>,
    pub nytimes: Vec<HeadlineItem>,
    pub business: Snapshot,
    pub weather: Snapshot,
}

impl SourceBundle {
    /// True when none of the three headline sources has anything.
    pub fn primary_news_empty(&self) -> bool {
        self.gnews.is_empty() && self.newsapi.is_empty() && self.nytimes.is_empty()
    }

    /// Store `data` in the slot of `kind`. A shape that doesn't fit the slot is dropped.
    pub fn insert(&mut self, kind: SourceKind, data: SourceData) {
        match (kind, data) {
            (SourceKind::GNews, SourceData::Headlines(v)) => self.gnews = v,
            (SourceKind::NewsApi, SourceData::Headlines(v)) => self.newsapi = v,
            (SourceKind::NyTimes, SourceData::Headlines(v)) => self.nytimes = v,
            (SourceKind::AlphaVantage, SourceData::Snapshot(m)) => self.business = m,
            (SourceKind::Weather, SourceData::Snapshot(m)) => self.weather = m,
            (kind, _) => {
                tracing::warn!(source = kind.name(), "unexpected data shape; ignored");
            }
        }
    }
}

/// The empty value of each source.
pub fn empty_for(kind: SourceKind) -> SourceData {
    match kind {
        SourceKind::AlphaVantage | SourceKind::Weather => SourceData::Snapshot(Snapshot::new()),
        _ => SourceData::Headlines(Vec::new()),
    }
}

/// Run one provider; any failure is logged, counted, and becomes the empty value.
pub async fn fetch_or_empty(provider: &dyn SourceProvider, cfg: &PodcastConfig) -> SourceData {
    ensure_metrics_described();
    let kind = provider.kind();
    match provider.fetch(cfg).await {
        Ok(data) => {
            counter!("source_items_total", "source" => kind.name()).increment(data.len() as u64);
            tracing::debug!(source = kind.name(), items = data.len(), "source fetched");
            data
        }
        Err(e) => {
            tracing::warn!(source = kind.name(), error = %e, "source fetch failed; using empty data");
            counter!("source_fetch_errors_total", "source" => kind.name()).increment(1);
            empty_for(kind)
        }
    }
}

/// Fetch every provider concurrently and collect the results. Never fails.
pub async fn fetch_all(providers: &[Arc<dyn SourceProvider>], cfg: &PodcastConfig) -> SourceBundle {
    let results = futures::future::join_all(
        providers
            .iter()
            .map(|p| async move { (p.kind(), fetch_or_empty(p.as_ref(), cfg).await) }),
    )
    .await;

    let mut bundle = SourceBundle::default();
    for (kind, data) in results {
        bundle.insert(kind, data);
    }
    bundle
}

/// Shared HTTP client for source fetches. Per-request timeouts come from config.
pub fn build_http_client(cfg: &PodcastConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(cfg.settings.sources.user_agent.clone())
        .connect_timeout(Duration::from_secs(4))
        .build()
}

/// The five production providers, sharing one client.
pub fn default_providers(http: reqwest::Client) -> Vec<Arc<dyn SourceProvider>> {
    vec![
        Arc::new(GNewsProvider::new(http.clone())),
        Arc::new(NewsApiProvider::new(http.clone())),
        Arc::new(NyTimesProvider::new(http.clone())),
        Arc::new(AlphaVantageProvider::new(http.clone())),
        Arc::new(WeatherProvider::new(http)),
    ]
}

// src/ingest/types.rs
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::PodcastConfig;

/// One record from a news list. Opaque: passed verbatim into the prompt.
pub type HeadlineItem = Value;

/// One JSON object (business sentiment feed, weather forecast). Opaque as well.
pub type Snapshot = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    GNews,
    NewsApi,
    NyTimes,
    AlphaVantage,
    Weather,
}

impl SourceKind {
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::GNews => "gnews",
            SourceKind::NewsApi => "newsapi",
            SourceKind::NyTimes => "nytimes",
            SourceKind::AlphaVantage => "alpha_vantage",
            SourceKind::Weather => "weather",
        }
    }

    /// General, aggregator and long-form headlines. Their joint absence selects the fallback prompt.
    pub fn is_primary_news(self) -> bool {
        matches!(
            self,
            SourceKind::GNews | SourceKind::NewsApi | SourceKind::NyTimes
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceData {
    Headlines(Vec<HeadlineItem>),
    Snapshot(Snapshot),
}

impl SourceData {
    pub fn is_empty(&self) -> bool {
        match self {
            SourceData::Headlines(v) => v.is_empty(),
            SourceData::Snapshot(m) => m.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceData::Headlines(v) => v.len(),
            SourceData::Snapshot(m) => usize::from(!m.is_empty()),
        }
    }
}

/// Every way a single fetch can fail. Never leaves `ingest`: `fetch_all` turns it into empty data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0} not configured")]
    MissingCredential(&'static str),

    #[error("request timed out")]
    Timeout,

    #[error("http error: {0}")]
    Http(reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream reported an error: {0}")]
    Upstream(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

// Keys travel in the query string, so the URL never goes into the error.
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else {
            FetchError::Http(e)
        }
    }
}

/// One upstream data provider. Implementations may fail; callers go through `ingest::fetch_or_empty`.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch(&self, cfg: &PodcastConfig) -> Result<SourceData, FetchError>;
    fn kind(&self) -> SourceKind;
}

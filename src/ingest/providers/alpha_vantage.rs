// src/ingest/providers/alpha_vantage.rs
use async_trait::async_trait;
use serde_json::Value;

use super::{get_json, require_key};
use crate::config::podcast::ENV_ALPHA_VANTAGE_API_KEY;
use crate::config::PodcastConfig;
use crate::ingest::types::{FetchError, SourceData, SourceKind, SourceProvider, Snapshot};

/// Keys Alpha Vantage uses for rate-limit and error notices (delivered with HTTP 200).
const NOTICE_KEYS: [&str; 3] = ["Information", "Note", "Error Message"];

/// Business/market news with sentiment scores. Kept as one whole payload.
pub struct AlphaVantageProvider {
    http: reqwest::Client,
}

impl AlphaVantageProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn parse_body(body: Value) -> Result<Snapshot, FetchError> {
        let Value::Object(map) = body else {
            return Err(FetchError::Malformed("expected a JSON object".into()));
        };
        if !map.contains_key("feed") {
            if let Some(notice) = NOTICE_KEYS.iter().find_map(|k| map.get(*k)) {
                let msg = notice.as_str().map(str::to_string).unwrap_or_else(|| notice.to_string());
                return Err(FetchError::Upstream(msg));
            }
        }
        Ok(map)
    }
}

#[async_trait]
impl SourceProvider for AlphaVantageProvider {
    async fn fetch(&self, cfg: &PodcastConfig) -> Result<SourceData, FetchError> {
        let key = require_key(&cfg.keys.alpha_vantage, ENV_ALPHA_VANTAGE_API_KEY)?;
        let url = format!("{}/query", cfg.settings.sources.alpha_vantage_url);
        let body = get_json(
            &self.http,
            cfg,
            &url,
            &[
                ("function", "NEWS_SENTIMENT"),
                ("limit", "10"),
                ("sort", "RELEVANCE"),
                ("apikey", key),
            ],
        )
        .await?;
        Self::parse_body(body).map(SourceData::Snapshot)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::AlphaVantage
    }
}

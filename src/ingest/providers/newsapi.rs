// src/ingest/providers/newsapi.rs
use async_trait::async_trait;
use serde_json::Value;

use super::{array_field, get_json, require_key};
use crate::config::podcast::ENV_NEWSAPI_API_KEY;
use crate::config::PodcastConfig;
use crate::ingest::types::{FetchError, HeadlineItem, SourceData, SourceKind, SourceProvider};

/// Aggregated US top headlines from NewsAPI.
pub struct NewsApiProvider {
    http: reqwest::Client,
}

impl NewsApiProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn parse_body(body: &Value) -> Result<Vec<HeadlineItem>, FetchError> {
        match body.get("status").and_then(Value::as_str) {
            Some("ok") => array_field(body, "articles"),
            _ => {
                let msg = body
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error");
                Err(FetchError::Upstream(msg.to_string()))
            }
        }
    }
}

#[async_trait]
impl SourceProvider for NewsApiProvider {
    async fn fetch(&self, cfg: &PodcastConfig) -> Result<SourceData, FetchError> {
        let key = require_key(&cfg.keys.newsapi, ENV_NEWSAPI_API_KEY)?;
        let url = format!("{}/top-headlines", cfg.settings.sources.newsapi_url);
        let body = get_json(
            &self.http,
            cfg,
            &url,
            &[("country", "us"), ("pageSize", "10"), ("apiKey", key)],
        )
        .await?;
        Self::parse_body(&body).map(SourceData::Headlines)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::NewsApi
    }
}

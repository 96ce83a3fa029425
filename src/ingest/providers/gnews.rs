// src/ingest/providers/gnews.rs
use async_trait::async_trait;
use serde_json::Value;

use super::{array_field, get_json, require_key};
use crate::config::podcast::ENV_GNEWS_API_KEY;
use crate::config::PodcastConfig;
use crate::ingest::types::{FetchError, HeadlineItem, SourceData, SourceKind, SourceProvider};

/// General top headlines (US, English).
pub struct GNewsProvider {
    http: reqwest::Client,
}

impl GNewsProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn parse_body(body: &Value) -> Result<Vec<HeadlineItem>, FetchError> {
        // GNews reports failures as {"errors": [...]} (sometimes with a 2xx status).
        if let Some(errors) = body.get("errors") {
            return Err(FetchError::Upstream(errors.to_string()));
        }
        array_field(body, "articles")
    }
}

#[async_trait]
impl SourceProvider for GNewsProvider {
    async fn fetch(&self, cfg: &PodcastConfig) -> Result<SourceData, FetchError> {
        let key = require_key(&cfg.keys.gnews, ENV_GNEWS_API_KEY)?;
        let url = format!("{}/top-headlines", cfg.settings.sources.gnews_url);
        let body = get_json(
            &self.http,
            cfg,
            &url,
            &[
                ("category", "general"),
                ("lang", "en"),
                ("country", "us"),
                ("max", "10"),
                ("apikey", key),
            ],
        )
        .await?;
        Self::parse_body(&body).map(SourceData::Headlines)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::GNews
    }
}

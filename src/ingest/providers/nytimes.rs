// src/ingest/providers/nytimes.rs
use async_trait::async_trait;
use serde_json::Value;

use super::{get_json, require_key};
use crate::config::podcast::ENV_NYTIMES_API_KEY;
use crate::config::PodcastConfig;
use crate::ingest::types::{FetchError, HeadlineItem, SourceData, SourceKind, SourceProvider};

/// Sections fetched in order; results are concatenated.
const SECTIONS: [&str; 2] = ["us", "home"];

/// NYT Top Stories (long-form). Two sections per fetch.
pub struct NyTimesProvider {
    http: reqwest::Client,
}

impl NyTimesProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// `results` of one section. A section without `results` contributes nothing.
    pub fn section_results(section: &str, body: &Value) -> Vec<HeadlineItem> {
        match body.get("results") {
            Some(Value::Array(items)) => items.clone(),
            _ => {
                tracing::warn!(section, "nytimes response has no 'results' array");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SourceProvider for NyTimesProvider {
    async fn fetch(&self, cfg: &PodcastConfig) -> Result<SourceData, FetchError> {
        let key = require_key(&cfg.keys.nytimes, ENV_NYTIMES_API_KEY)?;

        // Any HTTP failure empties the whole source, even if the first section succeeded.
        let mut out = Vec::new();
        for section in SECTIONS {
            let url = format!("{}/{section}.json", cfg.settings.sources.nytimes_url);
            let body = get_json(&self.http, cfg, &url, &[("api-key", key)]).await?;
            out.extend(Self::section_results(section, &body));
        }
        Ok(SourceData::Headlines(out))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::NyTimes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_results_contributes_nothing() {
        let body = json!({"status": "OK", "fault": "quota"});
        assert!(NyTimesProvider::section_results("us", &body).is_empty());
    }

    #[test]
    fn results_are_kept_in_order() {
        let body = json!({
            "status": "OK",
            "results": [
                {"title": "One", "abstract": "a", "url": "https://nyt.test/1", "published_date": "2025-01-01"},
                {"title": "Two", "abstract": "b", "url": "https://nyt.test/2", "published_date": "2025-01-02"}
            ]
        });
        let items = NyTimesProvider::section_results("home", &body);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "One");
    }
}

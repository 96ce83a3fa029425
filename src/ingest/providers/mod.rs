// src/ingest/providers/mod.rs
pub mod alpha_vantage;
pub mod gnews;
pub mod newsapi;
pub mod nytimes;
pub mod weather;

use std::time::Duration;

use serde_json::Value;

use crate::config::PodcastConfig;
use crate::ingest::types::FetchError;

const ERROR_BODY_MAX_CHARS: usize = 300;

/// GET `url` with `query`, bounded by the configured fetch timeout, and parse the body as JSON.
pub(crate) async fn get_json(
    http: &reqwest::Client,
    cfg: &PodcastConfig,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Value, FetchError> {
    let timeout = Duration::from_secs(cfg.settings.sources.fetch_timeout_secs);
    let resp = http.get(url).query(query).timeout(timeout).send().await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_MAX_CHARS).collect(),
        });
    }

    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| FetchError::Malformed(e.to_string()))
}

/// Pull an array field out of a JSON object; anything else is malformed.
pub(crate) fn array_field(body: &Value, field: &str) -> Result<Vec<Value>, FetchError> {
    match body.get(field) {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(FetchError::Malformed(format!("'{field}' is not an array"))),
        None => Err(FetchError::Malformed(format!("missing '{field}'"))),
    }
}

pub(crate) fn require_key<'a>(
    key: &'a Option<String>,
    env_name: &'static str,
) -> Result<&'a str, FetchError> {
    key.as_deref().ok_or(FetchError::MissingCredential(env_name))
}

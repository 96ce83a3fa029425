// src/ingest/providers/weather.rs
use async_trait::async_trait;
use serde_json::Value;

use super::{get_json, require_key};
use crate::config::podcast::ENV_WEATHER_API_KEY;
use crate::config::PodcastConfig;
use crate::ingest::types::{FetchError, SourceData, SourceKind, SourceProvider, Snapshot};

/// One-day forecast for `WEATHER_POSITION`, alerts included.
pub struct WeatherProvider {
    http: reqwest::Client,
}

impl WeatherProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn parse_body(body: Value) -> Result<Snapshot, FetchError> {
        match body {
            Value::Object(map) => match map.get("error") {
                Some(err) => Err(FetchError::Upstream(err.to_string())),
                None => Ok(map),
            },
            _ => Err(FetchError::Malformed("expected a JSON object".into())),
        }
    }
}

#[async_trait]
impl SourceProvider for WeatherProvider {
    async fn fetch(&self, cfg: &PodcastConfig) -> Result<SourceData, FetchError> {
        let key = require_key(&cfg.keys.weather, ENV_WEATHER_API_KEY)?;
        let url = format!("{}/forecast.json", cfg.settings.sources.weather_url);
        let body = get_json(
            &self.http,
            cfg,
            &url,
            &[
                ("key", key),
                ("q", cfg.weather_position.as_str()),
                ("days", "1"),
                ("aqi", "no"),
                ("alerts", "yes"),
            ],
        )
        .await?;
        Self::parse_body(body).map(SourceData::Snapshot)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Weather
    }
}

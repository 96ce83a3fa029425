// src/config/podcast.rs
use anyhow::Context;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

// --- env defaults & names ---
pub const DEFAULT_PODCAST_CONFIG_PATH: &str = "config/podcast.toml";
pub const ENV_PODCAST_CONFIG_PATH: &str = "PODCAST_CONFIG_PATH";

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_NEWSAPI_API_KEY: &str = "NEWSAPI_API_KEY";
pub const ENV_GNEWS_API_KEY: &str = "GNEWS_API_KEY";
pub const ENV_NYTIMES_API_KEY: &str = "NYTIMES_API_KEY";
pub const ENV_ALPHA_VANTAGE_API_KEY: &str = "ALPHA_VANTAGE_API_KEY";
pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";
pub const ENV_WEATHER_POSITION: &str = "WEATHER_POSITION";
pub const ENV_STATIC_DIR: &str = "STATIC_DIR";

/// San Francisco, used when WEATHER_POSITION is unset.
pub const DEFAULT_WEATHER_POSITION: &str = "37.7749,-122.4194";

fn default_gnews_url() -> String {
    "https://gnews.io/api/v4".to_string()
}
fn default_newsapi_url() -> String {
    "https://newsapi.org/v2".to_string()
}
fn default_nytimes_url() -> String {
    "https://api.nytimes.com/svc/topstories/v2".to_string()
}
fn default_alpha_vantage_url() -> String {
    "https://www.alphavantage.co".to_string()
}
fn default_weather_url() -> String {
    "http://api.weatherapi.com/v1".to_string()
}
fn default_fetch_timeout_secs() -> u64 {
    15
}
fn default_prompt_items() -> usize {
    5
}
fn default_user_agent() -> String {
    "daily-briefing/0.1".to_string()
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_script_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_temperature() -> f32 {
    0.8
}
fn default_max_output_tokens() -> u32 {
    8192
}
fn default_generation_timeout_secs() -> u64 {
    120
}

fn default_speech_models() -> Vec<String> {
    vec![
        "gemini-2.5-flash-preview-tts".to_string(),
        "gemini-2.5-pro-preview-tts".to_string(),
    ]
}
fn default_voice() -> String {
    "Fenrir".to_string()
}
fn default_attempts_per_model() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_speech_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesSection {
    #[serde(default = "default_gnews_url")]
    pub gnews_url: String,
    #[serde(default = "default_newsapi_url")]
    pub newsapi_url: String,
    #[serde(default = "default_nytimes_url")]
    pub nytimes_url: String,
    #[serde(default = "default_alpha_vantage_url")]
    pub alpha_vantage_url: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// How many list items per source end up in the prompt.
    #[serde(default = "default_prompt_items")]
    pub prompt_items_per_source: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            gnews_url: default_gnews_url(),
            newsapi_url: default_newsapi_url(),
            nytimes_url: default_nytimes_url(),
            alpha_vantage_url: default_alpha_vantage_url(),
            weather_url: default_weather_url(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            prompt_items_per_source: default_prompt_items(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSection {
    #[serde(default = "default_gemini_url")]
    pub base_url: String,
    #[serde(default = "default_script_model")]
    pub script_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            base_url: default_gemini_url(),
            script_model: default_script_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechSection {
    /// Preference order: first entry is the primary model.
    #[serde(default = "default_speech_models")]
    pub models: Vec<String>,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_attempts_per_model")]
    pub attempts_per_model: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechSection {
    fn default() -> Self {
        Self {
            models: default_speech_models(),
            voice: default_voice(),
            attempts_per_model: default_attempts_per_model(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_speech_timeout_secs(),
        }
    }
}

impl SpeechSection {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn default_static_dir() -> String {
    "static".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Served as the router fallback (player page).
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
        }
    }
}

/// Non-secret settings, as they appear in `config/podcast.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub speech: SpeechSection,
    #[serde(default)]
    pub server: ServerSection,
}

impl Settings {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut settings: Settings = toml::from_str(s).context("parsing podcast settings")?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading podcast settings from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// $PODCAST_CONFIG_PATH (must exist), then config/podcast.toml, then defaults.
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = std::env::var(ENV_PODCAST_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("{ENV_PODCAST_CONFIG_PATH} points to non-existent path");
            }
            return Self::load_from_file(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_PODCAST_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        Ok(Self::default())
    }

    /// Clamp out-of-range values instead of failing startup.
    fn sanitize(&mut self) {
        if self.sources.prompt_items_per_source == 0 {
            self.sources.prompt_items_per_source = default_prompt_items();
        }
        if self.sources.fetch_timeout_secs == 0 {
            self.sources.fetch_timeout_secs = default_fetch_timeout_secs();
        }
        let t = self.generation.temperature;
        self.generation.temperature = if t.is_nan() {
            default_temperature()
        } else {
            t.clamp(0.0, 2.0)
        };
        if self.generation.max_output_tokens == 0 {
            self.generation.max_output_tokens = default_max_output_tokens();
        }
        self.speech.models.retain(|m| !m.trim().is_empty());
        if self.speech.models.is_empty() {
            self.speech.models = default_speech_models();
        }
        if self.speech.attempts_per_model == 0 {
            self.speech.attempts_per_model = 1;
        }
        if self.speech.voice.trim().is_empty() {
            self.speech.voice = default_voice();
        }
        if self.server.static_dir.trim().is_empty() {
            self.server.static_dir = default_static_dir();
        }
    }
}

/// Credentials for every upstream. Blank env values count as missing.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub gemini: Option<String>,
    pub newsapi: Option<String>,
    pub gnews: Option<String>,
    pub nytimes: Option<String>,
    pub alpha_vantage: Option<String>,
    pub weather: Option<String>,
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self {
            gemini: env_key(ENV_GEMINI_API_KEY),
            newsapi: env_key(ENV_NEWSAPI_API_KEY),
            gnews: env_key(ENV_GNEWS_API_KEY),
            nytimes: env_key(ENV_NYTIMES_API_KEY),
            alpha_vantage: env_key(ENV_ALPHA_VANTAGE_API_KEY),
            weather: env_key(ENV_WEATHER_API_KEY),
        }
    }

    fn entries(&self) -> [(&'static str, Option<&String>); 6] {
        [
            (ENV_GEMINI_API_KEY, self.gemini.as_ref()),
            (ENV_NEWSAPI_API_KEY, self.newsapi.as_ref()),
            (ENV_GNEWS_API_KEY, self.gnews.as_ref()),
            (ENV_NYTIMES_API_KEY, self.nytimes.as_ref()),
            (ENV_ALPHA_VANTAGE_API_KEY, self.alpha_vantage.as_ref()),
            (ENV_WEATHER_API_KEY, self.weather.as_ref()),
        ]
    }

    /// Names of the env vars that were not provided.
    pub fn missing(&self) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| name)
            .collect()
    }
}

// Safe diagnostics: only key lengths, never values.
impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ApiKeys");
        for (name, v) in self.entries() {
            d.field(name, &v.map(|k| k.len()));
        }
        d.finish()
    }
}

/// Everything the pipeline needs, built once at process start and shared by reference.
#[derive(Debug, Clone)]
pub struct PodcastConfig {
    pub keys: ApiKeys,
    pub weather_position: String,
    pub settings: Settings,
}

impl PodcastConfig {
    pub fn new(keys: ApiKeys, weather_position: impl Into<String>, settings: Settings) -> Self {
        Self {
            keys,
            weather_position: weather_position.into(),
            settings,
        }
    }

    /// Reads keys and WEATHER_POSITION from env and settings from the TOML file.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut settings = Settings::load_default()?;
        if let Some(dir) = env_key(ENV_STATIC_DIR) {
            settings.server.static_dir = dir;
        }
        let keys = ApiKeys::from_env();
        for name in keys.missing() {
            warn!("{name} not set; the matching upstream will be skipped");
        }
        let weather_position = env_key(ENV_WEATHER_POSITION).unwrap_or_else(|| {
            warn!("{ENV_WEATHER_POSITION} not set; defaulting to {DEFAULT_WEATHER_POSITION}");
            DEFAULT_WEATHER_POSITION.to_string()
        });
        info!(
            script_model = %settings.generation.script_model,
            speech_models = ?settings.speech.models,
            voice = %settings.speech.voice,
            "podcast config loaded"
        );
        Ok(Self::new(keys, weather_position, settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let s = Settings::from_toml_str("").unwrap();
        assert_eq!(s.sources.fetch_timeout_secs, 15);
        assert_eq!(s.sources.prompt_items_per_source, 5);
        assert_eq!(s.speech.attempts_per_model, 2);
        assert_eq!(s.speech.retry_delay(), Duration::from_secs(1));
        assert_eq!(s.speech.models.len(), 2);
        assert_eq!(s.speech.voice, "Fenrir");
    }

    #[test]
    fn sanitize_fixes_out_of_range_values() {
        let toml = r#"
[generation]
temperature = 9.5

[speech]
models = ["", "  "]
attempts_per_model = 0
"#;
        let s = Settings::from_toml_str(toml).unwrap();
        assert_eq!(s.generation.temperature, 2.0);
        assert_eq!(s.speech.models, default_speech_models());
        assert_eq!(s.speech.attempts_per_model, 1);
    }

    #[test]
    fn temperature_is_clamped_into_range() {
        let s = Settings::from_toml_str("[generation]\ntemperature = -1.5\n").unwrap();
        assert_eq!(s.generation.temperature, 0.0);
        let s = Settings::from_toml_str("[generation]\ntemperature = 1.3\n").unwrap();
        assert_eq!(s.generation.temperature, 1.3);
        let s = Settings::from_toml_str("[generation]\ntemperature = nan\n").unwrap();
        assert_eq!(s.generation.temperature, default_temperature());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let keys = ApiKeys {
            gemini: Some("super-secret-value".into()),
            ..ApiKeys::default()
        };
        let out = format!("{keys:?}");
        assert!(!out.contains("super-secret-value"));
        assert!(out.contains("18"));
        assert_eq!(keys.missing().len(), 5);
    }
}

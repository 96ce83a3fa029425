// tests/common/mod.rs
// In-process stand-ins for the upstream APIs.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::json;

use daily_briefing::config::{ApiKeys, PodcastConfig, Settings};
use daily_briefing::gemini::{
    GenerateContentResponse, ModelCallError, SamplingParams, SpeechModel, TextModel,
};
use daily_briefing::ingest::types::{
    FetchError, SourceData, SourceKind, SourceProvider,
};

pub const PRIMARY: &str = "tts-primary";
pub const FALLBACK: &str = "tts-fallback";

/// Config with a Gemini key, two speech models and no retry delay.
pub fn test_config() -> PodcastConfig {
    let mut settings = Settings::default();
    settings.speech.models = vec![PRIMARY.to_string(), FALLBACK.to_string()];
    settings.speech.retry_delay_ms = 0;
    let keys = ApiKeys {
        gemini: Some("test-key".into()),
        ..ApiKeys::default()
    };
    PodcastConfig::new(keys, "Prague", settings)
}

pub fn pcm(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

/// A speech response carrying `bytes` as inline base64 data.
pub fn audio_response(bytes: &[u8], mime: &str) -> GenerateContentResponse {
    let data = base64::engine::general_purpose::STANDARD.encode(bytes);
    serde_json::from_value(json!({
        "candidates": [{
            "content": {"parts": [{"inlineData": {"mimeType": mime, "data": data}}]}
        }]
    }))
    .expect("valid response json")
}

pub fn long_script() -> String {
    "Good morning, here is what is happening around the world today. ".repeat(4)
}

// ------------------------------------------------------------
// Sources
// ------------------------------------------------------------

pub struct StaticSource {
    pub kind: SourceKind,
    pub data: SourceData,
}

impl StaticSource {
    pub fn headlines(kind: SourceKind, titles: &[&str]) -> Arc<dyn SourceProvider> {
        let items = titles.iter().map(|t| json!({ "title": t })).collect();
        Arc::new(Self {
            kind,
            data: SourceData::Headlines(items),
        })
    }

    pub fn snapshot(kind: SourceKind, key: &str, value: serde_json::Value) -> Arc<dyn SourceProvider> {
        let mut m = serde_json::Map::new();
        m.insert(key.to_string(), value);
        Arc::new(Self {
            kind,
            data: SourceData::Snapshot(m),
        })
    }
}

#[async_trait]
impl SourceProvider for StaticSource {
    async fn fetch(&self, _cfg: &PodcastConfig) -> Result<SourceData, FetchError> {
        Ok(self.data.clone())
    }
    fn kind(&self) -> SourceKind {
        self.kind
    }
}

pub struct FailingSource(pub SourceKind);

#[async_trait]
impl SourceProvider for FailingSource {
    async fn fetch(&self, _cfg: &PodcastConfig) -> Result<SourceData, FetchError> {
        Err(FetchError::Status {
            status: 503,
            body: "upstream down".into(),
        })
    }
    fn kind(&self) -> SourceKind {
        self.0
    }
}

pub fn all_failing_sources() -> Vec<Arc<dyn SourceProvider>> {
    [
        SourceKind::GNews,
        SourceKind::NewsApi,
        SourceKind::NyTimes,
        SourceKind::AlphaVantage,
        SourceKind::Weather,
    ]
    .into_iter()
    .map(|k| Arc::new(FailingSource(k)) as Arc<dyn SourceProvider>)
    .collect()
}

// ------------------------------------------------------------
// Text model
// ------------------------------------------------------------

pub struct FixedText {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FixedText {
    pub fn new(reply: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.map(str::to_string),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl TextModel for FixedText {
    async fn generate_text(
        &self,
        prompt: &str,
        _params: SamplingParams,
    ) -> Result<Option<String>, ModelCallError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
    fn model_name(&self) -> &str {
        "fixed-text"
    }
}

pub struct BrokenText;

#[async_trait]
impl TextModel for BrokenText {
    async fn generate_text(
        &self,
        _prompt: &str,
        _params: SamplingParams,
    ) -> Result<Option<String>, ModelCallError> {
        Err(ModelCallError::Status {
            status: 429,
            body: "quota".into(),
        })
    }
    fn model_name(&self) -> &str {
        "broken-text"
    }
}

// ------------------------------------------------------------
// Speech model
// ------------------------------------------------------------

pub enum Reply {
    Audio(GenerateContentResponse),
    NoCandidates,
    Fail(u16),
}

/// Replies are consumed per model in order; an exhausted queue fails with 500.
pub struct ScriptedSpeech {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedSpeech {
    pub fn new(replies: Vec<(&str, Vec<Reply>)>) -> Arc<Self> {
        let map = replies
            .into_iter()
            .map(|(m, r)| (m.to_string(), r.into_iter().collect()))
            .collect();
        Arc::new(Self {
            replies: Mutex::new(map),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechModel for ScriptedSpeech {
    async fn generate_speech(
        &self,
        model: &str,
        _script: &str,
        _voice: &str,
    ) -> Result<GenerateContentResponse, ModelCallError> {
        self.calls.lock().unwrap().push(model.to_string());
        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(model)
            .and_then(|q| q.pop_front());
        match next {
            Some(Reply::Audio(resp)) => Ok(resp),
            Some(Reply::NoCandidates) => Ok(GenerateContentResponse::default()),
            Some(Reply::Fail(status)) => Err(ModelCallError::Status {
                status,
                body: format!("{model} unavailable"),
            }),
            None => Err(ModelCallError::Status {
                status: 500,
                body: "no scripted reply".into(),
            }),
        }
    }
}

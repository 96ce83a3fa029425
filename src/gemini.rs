//! Gemini `generateContent` client: wire types, the two model seams used by the
//! pipeline (`TextModel`, `SpeechModel`) and the HTTP implementation of both.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PodcastConfig;

// ------------------------------------------------------------
// Wire types
// ------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    /// Base64 of the raw bytes.
    #[serde(default)]
    pub data: String,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if there is any text at all.
    pub fn first_text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    contents: Vec<ReqContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct ReqContent<'a> {
    parts: Vec<ReqPart<'a>>,
}

#[derive(Serialize)]
struct ReqPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

// ------------------------------------------------------------
// Model seams
// ------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ModelCallError {
    #[error("GEMINI_API_KEY not configured")]
    MissingApiKey,

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ModelCallError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ModelCallError::Timeout
        } else if e.is_decode() {
            ModelCallError::Decode(e.to_string())
        } else {
            ModelCallError::Http(e)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Text generation: one prompt in, optional text out.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// `Ok(None)` means the call succeeded but produced no text.
    async fn generate_text(
        &self,
        prompt: &str,
        params: SamplingParams,
    ) -> Result<Option<String>, ModelCallError>;
    fn model_name(&self) -> &str;
}

/// Speech generation: one script in, the raw response out (candidates may be empty).
#[async_trait]
pub trait SpeechModel: Send + Sync {
    async fn generate_speech(
        &self,
        model: &str,
        script: &str,
        voice: &str,
    ) -> Result<GenerateContentResponse, ModelCallError>;
}

// ------------------------------------------------------------
// HTTP client
// ------------------------------------------------------------

const ERROR_BODY_MAX_CHARS: usize = 500;

/// Talks to `{base_url}/models/{model}:generateContent`.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    script_model: String,
    text_timeout: Duration,
    speech_timeout: Duration,
}

impl GeminiClient {
    pub fn from_config(cfg: &PodcastConfig) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.settings.sources.user_agent.clone())
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let generation = &cfg.settings.generation;
        Ok(Self {
            http,
            api_key: cfg.keys.gemini.clone(),
            base_url: generation.base_url.trim_end_matches('/').to_string(),
            script_model: generation.script_model.clone(),
            text_timeout: Duration::from_secs(generation.timeout_secs),
            speech_timeout: Duration::from_secs(cfg.settings.speech.timeout_secs),
        })
    }

    async fn generate_content(
        &self,
        model: &str,
        req: &Request<'_>,
        timeout: Duration,
    ) -> Result<GenerateContentResponse, ModelCallError> {
        let key = self.api_key.as_deref().ok_or(ModelCallError::MissingApiKey)?;
        let url = format!("{}/models/{model}:generateContent", self.base_url);

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", key)
            .timeout(timeout)
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelCallError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_MAX_CHARS).collect(),
            });
        }
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| ModelCallError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate_text(
        &self,
        prompt: &str,
        params: SamplingParams,
    ) -> Result<Option<String>, ModelCallError> {
        let req = Request {
            contents: vec![ReqContent {
                parts: vec![ReqPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: Some(params.temperature),
                max_output_tokens: Some(params.max_output_tokens),
                ..GenerationConfig::default()
            },
        };
        let resp = self
            .generate_content(&self.script_model, &req, self.text_timeout)
            .await?;
        Ok(resp.first_text())
    }

    fn model_name(&self) -> &str {
        &self.script_model
    }
}

#[async_trait]
impl SpeechModel for GeminiClient {
    async fn generate_speech(
        &self,
        model: &str,
        script: &str,
        voice: &str,
    ) -> Result<GenerateContentResponse, ModelCallError> {
        let req = Request {
            contents: vec![ReqContent {
                parts: vec![ReqPart { text: script }],
            }],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["AUDIO"]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig { voice_name: voice },
                    },
                }),
                ..GenerationConfig::default()
            },
        };
        self.generate_content(model, &req, self.speech_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn speech_request_uses_camel_case_wire_names() {
        let req = Request {
            contents: vec![ReqContent {
                parts: vec![ReqPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["AUDIO"]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig { voice_name: "Fenrir" },
                    },
                }),
                ..GenerationConfig::default()
            },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            v["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Fenrir"
        );
        assert!(v["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn response_with_inline_audio_deserializes() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"inlineData": {"mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAAA"}}]
                },
                "finishReason": "STOP"
            }]
        });
        let resp: GenerateContentResponse = serde_json::from_value(body).unwrap();
        let part = &resp.candidates[0].content.as_ref().unwrap().parts[0];
        assert_eq!(part.inline_data.as_ref().unwrap().mime_type, "audio/L16;codec=pcm;rate=24000");
        assert!(resp.first_text().is_none());
    }

    #[test]
    fn first_text_joins_parts_and_handles_empty() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}]
        }))
        .unwrap();
        assert_eq!(resp.first_text().as_deref(), Some("Hello world"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.candidates.is_empty());
        assert!(empty.first_text().is_none());
    }
}

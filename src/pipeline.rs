// src/pipeline.rs
//! Request Orchestrator: fetch -> compose -> generate -> synthesize -> package.
//! Strictly sequential after the (concurrent) fetch stage; the first failing stage
//! ends the run. Nothing partial is ever returned.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::audio::{self, WavAudio};
use crate::compose::{self, GenerationPrompt, PromptKind};
use crate::config::podcast::ENV_GEMINI_API_KEY;
use crate::config::PodcastConfig;
use crate::error::PipelineError;
use crate::gemini::{GeminiClient, SamplingParams, SpeechModel, TextModel};
use crate::ingest::{self, types::SourceProvider};
use crate::script::{self, Script};
use crate::speech::Synthesizer;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("podcast_runs_total", "Pipeline runs by outcome.");
        describe_counter!(
            "synthesis_attempts_total",
            "Speech synthesis calls by model and outcome."
        );
        describe_histogram!("podcast_duration_ms", "End-to-end pipeline time in milliseconds.");
    });
}

/// Short, anonymized id for logging a script without its text.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// A finished episode.
#[derive(Debug, Clone)]
pub struct PodcastAudio {
    pub wav: WavAudio,
    pub speech_model: String,
    pub prompt_kind: PromptKind,
    pub script_chars: usize,
}

pub struct Pipeline {
    config: Arc<PodcastConfig>,
    sources: Vec<Arc<dyn SourceProvider>>,
    writer: Arc<dyn TextModel>,
    voice: Arc<dyn SpeechModel>,
    synthesizer: Synthesizer,
}

impl Pipeline {
    pub fn new(
        config: Arc<PodcastConfig>,
        sources: Vec<Arc<dyn SourceProvider>>,
        writer: Arc<dyn TextModel>,
        voice: Arc<dyn SpeechModel>,
    ) -> Self {
        let synthesizer = Synthesizer::from_settings(&config.settings.speech);
        Self {
            config,
            sources,
            writer,
            voice,
            synthesizer,
        }
    }

    /// Production wiring: real source providers and one Gemini client for text and speech.
    pub fn from_config(config: Arc<PodcastConfig>) -> anyhow::Result<Self> {
        let http = ingest::build_http_client(&config)?;
        let gemini = Arc::new(GeminiClient::from_config(&config)?);
        Ok(Self::new(
            config,
            ingest::default_providers(http),
            gemini.clone(),
            gemini,
        ))
    }

    pub fn config(&self) -> &PodcastConfig {
        &self.config
    }

    fn sampling(&self) -> SamplingParams {
        let g = &self.config.settings.generation;
        SamplingParams {
            temperature: g.temperature,
            max_output_tokens: g.max_output_tokens,
        }
    }

    fn require_gemini_key(&self) -> Result<(), PipelineError> {
        if self.config.keys.gemini.is_none() {
            return Err(PipelineError::ConfigMissing(ENV_GEMINI_API_KEY));
        }
        Ok(())
    }

    /// Fetch all sources and compose the prompt. Never fails.
    pub async fn compose_prompt(&self, date: NaiveDate) -> GenerationPrompt {
        let bundle = ingest::fetch_all(&self.sources, &self.config).await;
        let prompt = compose::compose(
            &bundle,
            date,
            self.config.settings.sources.prompt_items_per_source,
        );
        info!(
            kind = ?prompt.kind(),
            gnews = bundle.gnews.len(),
            newsapi = bundle.newsapi.len(),
            nytimes = bundle.nytimes.len(),
            business = !bundle.business.is_empty(),
            weather = !bundle.weather.is_empty(),
            "prompt composed"
        );
        prompt
    }

    /// Stages up to and including script generation.
    pub async fn write_script(
        &self,
        date: NaiveDate,
    ) -> Result<(GenerationPrompt, Script), PipelineError> {
        self.require_gemini_key()?;
        let prompt = self.compose_prompt(date).await;
        let script =
            script::generate_script(self.writer.as_ref(), prompt.text(), self.sampling()).await?;
        Ok((prompt, script))
    }

    /// Run every stage for today's date.
    pub async fn run(&self) -> Result<PodcastAudio, PipelineError> {
        self.run_on(chrono::Local::now().date_naive()).await
    }

    pub async fn run_on(&self, date: NaiveDate) -> Result<PodcastAudio, PipelineError> {
        ensure_metrics_described();
        let t0 = Instant::now();
        let out = self.run_stages(date).await;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("podcast_duration_ms").record(ms);
        match &out {
            Ok(ep) => {
                counter!("podcast_runs_total", "outcome" => "ok").increment(1);
                info!(
                    ms,
                    speech_model = %ep.speech_model,
                    wav_bytes = ep.wav.bytes.len(),
                    sample_rate = ep.wav.sample_rate,
                    "podcast ready"
                );
            }
            Err(e) => {
                counter!("podcast_runs_total", "outcome" => e.kind().as_str()).increment(1);
                warn!(ms, kind = e.kind().as_str(), error = %e, "podcast run failed");
            }
        }
        out
    }

    async fn run_stages(&self, date: NaiveDate) -> Result<PodcastAudio, PipelineError> {
        let (prompt, script) = self.write_script(date).await?;
        info!(
            script_id = %anon_hash(script.as_str()),
            chars = script.char_count(),
            "script accepted"
        );

        let synthesized = self
            .synthesizer
            .synthesize(self.voice.as_ref(), script.as_str())
            .await
            .map_err(|f| PipelineError::SynthesisAllModelsFailed {
                tried: f.tried,
                last_error: f.last_error,
            })?;
        info!(
            model = %synthesized.model,
            attempts = synthesized.total_attempts(),
            "speech synthesized"
        );

        let wav = audio::package_response(&synthesized.response)?;
        Ok(PodcastAudio {
            wav,
            speech_model: synthesized.model,
            prompt_kind: prompt.kind(),
            script_chars: script.char_count(),
        })
    }
}

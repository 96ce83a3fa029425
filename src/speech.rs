// src/speech.rs
//! Speech Synthesizer: ordered model fallback with a small per-model retry budget.
//!
//! States: `Trying { model, attempt }` -> `Success` on the first non-empty candidate
//! list, otherwise retry the same model after `retry_delay` until its budget is
//! spent, then move to the next model. `AllFailed` once every model is exhausted.
//! Worst-case latency is bounded by models x attempts x (call timeout + delay).

use std::time::Duration;

use metrics::counter;

use crate::config::podcast::SpeechSection;
use crate::gemini::{GenerateContentResponse, SpeechModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisAttempt {
    pub model: String,
    /// 1-based, per model.
    pub attempt: u32,
    /// `None` for the successful attempt.
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SynthesisSuccess {
    pub model: String,
    pub response: GenerateContentResponse,
    pub attempts: Vec<SynthesisAttempt>,
}

impl SynthesisSuccess {
    pub fn total_attempts(&self) -> usize {
        self.attempts.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisFailure {
    /// Every model that was attempted, in preference order.
    pub tried: Vec<String>,
    pub last_error: String,
    pub attempts: Vec<SynthesisAttempt>,
}

#[derive(Debug, Clone)]
pub enum SynthesisState {
    Trying { model: usize, attempt: u32 },
    Success(SynthesisSuccess),
    AllFailed(SynthesisFailure),
}

#[derive(Debug, Clone)]
pub struct Synthesizer {
    models: Vec<String>,
    voice: String,
    attempts_per_model: u32,
    retry_delay: Duration,
}

impl Synthesizer {
    pub fn new(
        models: Vec<String>,
        voice: impl Into<String>,
        attempts_per_model: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            models,
            voice: voice.into(),
            attempts_per_model: attempts_per_model.max(1),
            retry_delay,
        }
    }

    pub fn from_settings(s: &SpeechSection) -> Self {
        Self::new(
            s.models.clone(),
            s.voice.clone(),
            s.attempts_per_model,
            s.retry_delay(),
        )
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Where to go after a failed `(model, attempt)`; `None` means every model is exhausted.
    pub fn next_after_failure(&self, model: usize, attempt: u32) -> Option<(usize, u32)> {
        if attempt < self.attempts_per_model {
            Some((model, attempt + 1))
        } else if model + 1 < self.models.len() {
            Some((model + 1, 1))
        } else {
            None
        }
    }

    /// Drive the state machine to a terminal state.
    pub async fn synthesize(
        &self,
        speech: &dyn SpeechModel,
        script: &str,
    ) -> Result<SynthesisSuccess, SynthesisFailure> {
        let mut log: Vec<SynthesisAttempt> = Vec::new();
        let mut tried: Vec<String> = Vec::new();
        let mut last_error = String::from("no speech models configured");

        let mut state = if self.models.is_empty() {
            SynthesisState::AllFailed(SynthesisFailure {
                tried: Vec::new(),
                last_error: last_error.clone(),
                attempts: Vec::new(),
            })
        } else {
            SynthesisState::Trying {
                model: 0,
                attempt: 1,
            }
        };

        loop {
            state = match state {
                SynthesisState::Success(ok) => return Ok(ok),
                SynthesisState::AllFailed(fail) => return Err(fail),
                SynthesisState::Trying { model, attempt } => {
                    let name = &self.models[model];
                    if tried.last() != Some(name) {
                        tried.push(name.clone());
                    }
                    if attempt > 1 && !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                    tracing::info!(model = %name, attempt, "speech synthesis attempt");

                    let error = match speech.generate_speech(name, script, &self.voice).await {
                        Ok(resp) if !resp.candidates.is_empty() => {
                            counter!("synthesis_attempts_total", "model" => name.clone(), "outcome" => "success")
                                .increment(1);
                            log.push(SynthesisAttempt {
                                model: name.clone(),
                                attempt,
                                error: None,
                            });
                            state = SynthesisState::Success(SynthesisSuccess {
                                model: name.clone(),
                                response: resp,
                                attempts: std::mem::take(&mut log),
                            });
                            continue;
                        }
                        Ok(_) => "no candidates returned".to_string(),
                        Err(e) => e.to_string(),
                    };

                    counter!("synthesis_attempts_total", "model" => name.clone(), "outcome" => "failure")
                        .increment(1);
                    tracing::warn!(model = %name, attempt, error = %error, "speech synthesis attempt failed");
                    log.push(SynthesisAttempt {
                        model: name.clone(),
                        attempt,
                        error: Some(error.clone()),
                    });
                    last_error = error;

                    match self.next_after_failure(model, attempt) {
                        Some((model, attempt)) => SynthesisState::Trying { model, attempt },
                        None => SynthesisState::AllFailed(SynthesisFailure {
                            tried: std::mem::take(&mut tried),
                            last_error: last_error.clone(),
                            attempts: std::mem::take(&mut log),
                        }),
                    }
                }
            };
        }
    }
}

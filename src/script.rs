// src/script.rs
//! Script Generator: one text-model call, then a quality gate.

use thiserror::Error;

use crate::gemini::{ModelCallError, SamplingParams, TextModel};

/// Scripts shorter than this (in chars, after trimming) are rejected.
pub const MIN_SCRIPT_CHARS: usize = 100;

/// Prefix the upstream uses for in-band failures.
const ERROR_MARKER: &str = "Error";

/// Emphasis markup the model sometimes emits despite instructions.
const EMPHASIS_CHARS: [char; 2] = ['*', '_'];

/// A validated, cleaned script ready for the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script(String);

impl Script {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script generation failed: {0}")]
    CallFailed(#[source] ModelCallError),

    #[error("script generation returned no text")]
    Empty,

    #[error("script too short to generate audio ({chars} chars, need at least {min})")]
    TooShort { chars: usize, min: usize },

    #[error("{0}")]
    ErrorMarker(String),
}

/// Apply the quality gate to raw model output. Emphasis markup is stripped first, so the
/// emptiness and length checks see the text that will actually be spoken.
pub fn validate_script(raw: Option<String>) -> Result<Script, ScriptError> {
    let raw = raw.ok_or(ScriptError::Empty)?;
    let trimmed = raw.trim();
    if trimmed.starts_with(ERROR_MARKER) {
        return Err(ScriptError::ErrorMarker(trimmed.to_string()));
    }

    let cleaned: String = trimmed.chars().filter(|c| !EMPHASIS_CHARS.contains(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(ScriptError::Empty);
    }

    let chars = cleaned.chars().count();
    if chars < MIN_SCRIPT_CHARS {
        return Err(ScriptError::TooShort {
            chars,
            min: MIN_SCRIPT_CHARS,
        });
    }
    Ok(Script(cleaned.to_string()))
}

/// Invoke the model once (no retry) and validate the output.
pub async fn generate_script(
    model: &dyn TextModel,
    prompt: &str,
    params: SamplingParams,
) -> Result<Script, ScriptError> {
    let raw = model
        .generate_text(prompt, params)
        .await
        .map_err(ScriptError::CallFailed)?;
    let script = validate_script(raw)?;
    tracing::info!(
        model = model.model_name(),
        chars = script.char_count(),
        "script generated"
    );
    Ok(script)
}

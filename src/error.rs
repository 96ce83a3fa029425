// src/error.rs
//! Terminal error of one podcast run. Fetch failures never reach this type.

use serde::Serialize;
use thiserror::Error;

use crate::audio::AudioError;
use crate::script::ScriptError;

/// Failure category reported next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigMissing,
    GenerationEmpty,
    GenerationTooShort,
    GenerationCallFailed,
    SynthesisAllModelsFailed,
    ResponseMalformed,
    AudioDecodeFailed,
    AudioTooShort,
    AudioEncodeFailed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ConfigMissing => "config_missing",
            ErrorKind::GenerationEmpty => "generation_empty",
            ErrorKind::GenerationTooShort => "generation_too_short",
            ErrorKind::GenerationCallFailed => "generation_call_failed",
            ErrorKind::SynthesisAllModelsFailed => "synthesis_all_models_failed",
            ErrorKind::ResponseMalformed => "response_malformed",
            ErrorKind::AudioDecodeFailed => "audio_decode_failed",
            ErrorKind::AudioTooShort => "audio_too_short",
            ErrorKind::AudioEncodeFailed => "audio_encode_failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0} not configured.")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("TTS failed for all models ({}): {last_error}", .tried.join(", "))]
    SynthesisAllModelsFailed {
        tried: Vec<String>,
        last_error: String,
    },

    #[error(transparent)]
    Audio(#[from] AudioError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::ConfigMissing(_) => ErrorKind::ConfigMissing,
            PipelineError::Script(e) => match e {
                ScriptError::CallFailed(_) => ErrorKind::GenerationCallFailed,
                // An in-band "Error..." reply is a failed call reported as text.
                ScriptError::ErrorMarker(_) => ErrorKind::GenerationCallFailed,
                ScriptError::Empty => ErrorKind::GenerationEmpty,
                ScriptError::TooShort { .. } => ErrorKind::GenerationTooShort,
            },
            PipelineError::SynthesisAllModelsFailed { .. } => ErrorKind::SynthesisAllModelsFailed,
            PipelineError::Audio(e) => match e {
                AudioError::MalformedResponse(_) => ErrorKind::ResponseMalformed,
                AudioError::Decode(_) => ErrorKind::AudioDecodeFailed,
                AudioError::TooShort { .. } => ErrorKind::AudioTooShort,
                AudioError::Encode(_) => ErrorKind::AudioEncodeFailed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_failing_stage() {
        assert_eq!(
            PipelineError::from(ScriptError::TooShort { chars: 3, min: 100 }).kind(),
            ErrorKind::GenerationTooShort
        );
        assert_eq!(
            PipelineError::from(AudioError::TooShort { bytes: 500, min: 2000 }).kind(),
            ErrorKind::AudioTooShort
        );
        assert_eq!(
            PipelineError::from(AudioError::MalformedResponse("no candidate")).kind(),
            ErrorKind::ResponseMalformed
        );
        assert_eq!(ErrorKind::SynthesisAllModelsFailed.as_str(), "synthesis_all_models_failed");
    }

    #[test]
    fn synthesis_message_lists_models() {
        let e = PipelineError::SynthesisAllModelsFailed {
            tried: vec!["a".into(), "b".into()],
            last_error: "429".into(),
        };
        assert_eq!(e.to_string(), "TTS failed for all models (a, b): 429");
    }
}

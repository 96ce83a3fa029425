// src/audio.rs
//! Audio Packager: inline base64 PCM from the speech response -> WAV bytes.

use std::io::Cursor;

use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::gemini::GenerateContentResponse;

/// Decoded payloads below this many bytes are treated as truncated.
pub const MIN_AUDIO_BYTES: usize = 2000;
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;
pub const CHANNELS: u16 = 1;
pub const SAMPLE_WIDTH_BYTES: u16 = 2;
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

static RATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"rate=(\d+)").expect("rate regex"));

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("TTS response missing audio data ({0})")]
    MalformedResponse(&'static str),

    #[error("base64 decode failed: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("audio data too short ({bytes} bytes, need at least {min})")]
    TooShort { bytes: usize, min: usize },

    #[error("wav encoding failed: {0}")]
    Encode(#[from] hound::Error),
}

/// Base64 samples plus the declared media type, e.g. `audio/L16;codec=pcm;rate=24000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAudioPayload {
    pub data: String,
    pub mime_type: String,
}

/// Packaged result, ready to be sent as an `audio/wav` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavAudio {
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
    pub pcm_len: usize,
}

/// First candidate -> content -> first part -> inline data, or `MalformedResponse`.
pub fn extract_inline_audio(
    resp: &GenerateContentResponse,
) -> Result<InlineAudioPayload, AudioError> {
    let candidate = resp
        .candidates
        .first()
        .ok_or(AudioError::MalformedResponse("no candidate"))?;
    let content = candidate
        .content
        .as_ref()
        .ok_or(AudioError::MalformedResponse("no content"))?;
    let part = content
        .parts
        .first()
        .ok_or(AudioError::MalformedResponse("no parts"))?;
    let inline = part
        .inline_data
        .as_ref()
        .ok_or(AudioError::MalformedResponse("no inline data"))?;
    Ok(InlineAudioPayload {
        data: inline.data.clone(),
        mime_type: inline.mime_type.clone(),
    })
}

/// `rate=<N>` from the media type; 24000 when absent or unparsable.
pub fn parse_sample_rate(mime_type: &str) -> u32 {
    RATE_RE
        .captures(mime_type)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|r| *r > 0)
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// Wrap mono 16-bit little-endian PCM in a WAV container. Every sample byte is copied
/// unchanged, including a trailing byte that does not fill a whole frame.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let spec = hound::WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: SAMPLE_WIDTH_BYTES * 8,
        sample_format: hound::SampleFormat::Int,
    };

    let frame = usize::from(SAMPLE_WIDTH_BYTES);
    let samples = pcm.chunks_exact(frame);
    let tail = samples.remainder();

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 46));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        let mut fast = writer.get_i16_writer(samples.len() as u32);
        for s in samples {
            fast.write_sample(i16::from_le_bytes([s[0], s[1]]));
        }
        fast.flush()?;
        writer.finalize()?;
    }
    let mut bytes = cursor.into_inner();

    if !tail.is_empty() {
        tracing::warn!(bytes = pcm.len(), "odd PCM length; keeping partial trailing frame");
        append_to_data_chunk(&mut bytes, tail)?;
    }
    Ok(bytes)
}

/// Offset of the `data` chunk's size field inside a RIFF/WAVE buffer.
fn data_size_offset(wav: &[u8]) -> Option<usize> {
    let mut pos = 12;
    while pos + 8 <= wav.len() {
        let size = u32::from_le_bytes(wav[pos + 4..pos + 8].try_into().ok()?) as usize;
        if &wav[pos..pos + 4] == b"data" {
            return Some(pos + 4);
        }
        // Chunks are word aligned.
        pos += 8 + size + (size & 1);
    }
    None
}

/// Append `extra` to the final `data` chunk and fix both size fields.
/// An odd-sized chunk is followed by one pad byte.
fn append_to_data_chunk(wav: &mut Vec<u8>, extra: &[u8]) -> Result<(), AudioError> {
    let at = data_size_offset(wav)
        .ok_or(AudioError::Encode(hound::Error::FormatError("no data chunk")))?;
    let data_len = wav.len() - (at + 4) + extra.len();
    let data_len_u32 = u32::try_from(data_len)
        .map_err(|_| AudioError::Encode(hound::Error::FormatError("data chunk larger than 4 GiB")))?;

    wav.extend_from_slice(extra);
    if data_len % 2 == 1 {
        wav.push(0);
    }
    wav[at..at + 4].copy_from_slice(&data_len_u32.to_le_bytes());

    let riff_len = u32::try_from(wav.len() - 8)
        .map_err(|_| AudioError::Encode(hound::Error::FormatError("data chunk larger than 4 GiB")))?;
    wav[4..8].copy_from_slice(&riff_len.to_le_bytes());
    Ok(())
}

/// Decode, validate and wrap one payload.
pub fn package(payload: &InlineAudioPayload) -> Result<WavAudio, AudioError> {
    let pcm = base64::engine::general_purpose::STANDARD.decode(payload.data.trim())?;
    if pcm.len() < MIN_AUDIO_BYTES {
        return Err(AudioError::TooShort {
            bytes: pcm.len(),
            min: MIN_AUDIO_BYTES,
        });
    }
    let sample_rate = parse_sample_rate(&payload.mime_type);
    let bytes = pcm_to_wav(&pcm, sample_rate)?;
    tracing::debug!(pcm_bytes = pcm.len(), sample_rate, wav_bytes = bytes.len(), "audio packaged");
    Ok(WavAudio {
        bytes,
        sample_rate,
        pcm_len: pcm.len(),
    })
}

/// Full packager step for a synthesis response.
pub fn package_response(resp: &GenerateContentResponse) -> Result<WavAudio, AudioError> {
    let payload = extract_inline_audio(resp)?;
    package(&payload)
}

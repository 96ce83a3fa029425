// tests/audio_roundtrip.rs
mod common;

use std::io::Cursor;

use common::{audio_response, pcm};
use daily_briefing::audio::{self, AudioError, DEFAULT_SAMPLE_RATE, MIN_AUDIO_BYTES};

/// Read a container back: (channels, sample width in bytes, frame rate, raw sample bytes).
fn read_back(wav: &[u8]) -> (u16, u16, u32, Vec<u8>) {
    let mut reader = hound::WavReader::new(Cursor::new(wav)).expect("valid wav");
    let spec = reader.spec();
    let bytes = reader
        .samples::<i16>()
        .map(|s| s.expect("sample"))
        .flat_map(i16::to_le_bytes)
        .collect();
    (spec.channels, spec.bits_per_sample / 8, spec.sample_rate, bytes)
}

#[test]
fn container_round_trips_header_and_samples() {
    for (len, rate) in [(2000usize, 24_000u32), (4410, 44_100), (16_000, 16_000), (8, 8_000)] {
        let raw = pcm(len);
        let wav = audio::pcm_to_wav(&raw, rate).expect("encode");
        let (channels, width, frame_rate, body) = read_back(&wav);
        assert_eq!(channels, 1, "len={len}");
        assert_eq!(width, 2, "len={len}");
        assert_eq!(frame_rate, rate, "len={len}");
        assert_eq!(body, raw, "len={len}");
    }
}

/// Walk the RIFF chunks by hand: (channels, sample width in bytes, frame rate, data chunk bytes).
/// Works for odd-sized data chunks, which a sample reader cannot return whole.
fn read_raw(wav: &[u8]) -> (u16, u16, u32, Vec<u8>) {
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");
    let riff = u32::from_le_bytes(wav[4..8].try_into().unwrap()) as usize;
    assert_eq!(riff, wav.len() - 8, "RIFF size");

    let (mut fmt, mut data) = (None, None);
    let mut pos = 12;
    while pos + 8 <= wav.len() {
        let size = u32::from_le_bytes(wav[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let body = &wav[pos + 8..pos + 8 + size];
        match &wav[pos..pos + 4] {
            b"fmt " => fmt = Some(body.to_vec()),
            b"data" => data = Some(body.to_vec()),
            _ => {}
        }
        pos += 8 + size + (size & 1);
    }
    let fmt = fmt.expect("fmt chunk");
    let channels = u16::from_le_bytes([fmt[2], fmt[3]]);
    let rate = u32::from_le_bytes(fmt[4..8].try_into().unwrap());
    let bits = u16::from_le_bytes([fmt[14], fmt[15]]);
    (channels, bits / 8, rate, data.expect("data chunk"))
}

#[test]
fn odd_length_payload_is_kept_byte_for_byte() {
    for (len, rate) in [(2001usize, 24_000u32), (4411, 44_100), (3, 8_000)] {
        let raw = pcm(len);
        let wav = audio::pcm_to_wav(&raw, rate).expect("encode");
        let (channels, width, frame_rate, body) = read_raw(&wav);
        assert_eq!((channels, width, frame_rate), (1, 2, rate), "len={len}");
        assert_eq!(body.len(), len);
        assert_eq!(body, raw, "len={len}");
    }

    // Even lengths read the same way through both readers.
    let raw = pcm(2000);
    let wav = audio::pcm_to_wav(&raw, 24_000).unwrap();
    assert_eq!(read_raw(&wav), read_back(&wav));
}

#[test]
fn response_with_rate_token_packages_at_that_rate() {
    let raw = pcm(6000);
    let resp = audio_response(&raw, "audio/pcm;rate=16000");
    let wav = audio::package_response(&resp).expect("package");
    let (_, _, frame_rate, body) = read_back(&wav.bytes);
    assert_eq!(frame_rate, 16_000);
    assert_eq!(body, raw);
    assert_eq!(wav.pcm_len, 6000);
}

#[test]
fn response_without_rate_token_defaults() {
    let resp = audio_response(&pcm(3000), "audio/L16;codec=pcm");
    let wav = audio::package_response(&resp).expect("package");
    let (_, _, frame_rate, _) = read_back(&wav.bytes);
    assert_eq!(frame_rate, DEFAULT_SAMPLE_RATE);
}

#[test]
fn truncated_payload_is_too_short_not_a_container() {
    let resp = audio_response(&pcm(500), "audio/pcm;rate=24000");
    match audio::package_response(&resp) {
        Err(AudioError::TooShort { bytes, min }) => {
            assert_eq!(bytes, 500);
            assert_eq!(min, MIN_AUDIO_BYTES);
        }
        other => panic!("expected TooShort, got {other:?}"),
    }
}

#[test]
fn threshold_is_inclusive() {
    let resp = audio_response(&pcm(MIN_AUDIO_BYTES), "audio/pcm");
    assert!(audio::package_response(&resp).is_ok());

    let resp = audio_response(&pcm(MIN_AUDIO_BYTES - 2), "audio/pcm");
    assert!(matches!(
        audio::package_response(&resp),
        Err(AudioError::TooShort { .. })
    ));
}

//! PCM16 codec helpers for the realtime and speech paths.
//!
//! Outbound audio (microphone -> wire) is float samples packed as signed 16-bit
//! little-endian PCM and base64 encoded. Inbound audio (wire -> speaker) is the
//! reverse. Both directions carry their sample rate and channel count in
//! [`AudioFrame`] so the caller never has to guess the format.

use base64::prelude::*;
use thiserror::Error;

/// Scale factor between normalized float samples and PCM16 values.
const PCM16_SCALE: f32 = 32768.0;

// =============================================================================
// Error Types
// =============================================================================

/// Errors produced while decoding inbound audio.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Payload was not valid base64
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    /// PCM16 payloads must contain an even number of bytes
    #[error("PCM16 payload has odd byte length: {0}")]
    OddByteLength(usize),

    /// Sample rate or channel count cannot describe audio
    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),
}

// =============================================================================
// Audio Frame
// =============================================================================

/// A block of interleaved float samples with its format.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Interleaved samples in [-1.0, 1.0)
    pub samples: Vec<f32>,
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
}

impl AudioFrame {
    /// Create a frame, dropping any trailing partial frame.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        if channels > 0 {
            let whole = samples.len() - samples.len() % channels as usize;
            samples.truncate(whole);
        }
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Mono frame helper.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Playback duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Average interleaved channels down to a single channel.
    pub fn to_mono(&self) -> AudioFrame {
        if self.channels <= 1 {
            return self.clone();
        }
        let ch = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
            .collect();
        AudioFrame::mono(samples, self.sample_rate)
    }
}

// =============================================================================
// Encoding / Decoding
// =============================================================================

/// Convert one float sample to PCM16.
///
/// The product is truncated toward zero and wrapped into 16 bits without
/// clipping, so `1.0` becomes `-32768`. NaN maps to zero.
#[inline]
pub fn sample_to_pcm16(sample: f32) -> i16 {
    (sample * PCM16_SCALE) as i64 as i16
}

/// Convert one PCM16 value back to a float sample.
#[inline]
pub fn pcm16_to_sample(value: i16) -> f32 {
    value as f32 / PCM16_SCALE
}

/// Encode captured float samples as base64 PCM16LE.
pub fn encode_outbound(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&sample_to_pcm16(sample).to_le_bytes());
    }
    BASE64_STANDARD.encode(bytes)
}

/// Decode a base64 PCM16LE payload into a frame of the given format.
pub fn decode_inbound(data: &str, sample_rate: u32, channels: u16) -> Result<AudioFrame, CodecError> {
    if channels == 0 {
        return Err(CodecError::InvalidFormat("channel count is zero".to_string()));
    }
    if sample_rate == 0 {
        return Err(CodecError::InvalidFormat("sample rate is zero".to_string()));
    }

    let bytes = BASE64_STANDARD
        .decode(data.trim())
        .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;

    if bytes.len() % 2 != 0 {
        return Err(CodecError::OddByteLength(bytes.len()));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| pcm16_to_sample(i16::from_le_bytes([pair[0], pair[1]])))
        .collect();

    Ok(AudioFrame::new(samples, sample_rate, channels))
}

/// Root-mean-square amplitude of a block, 0.0 for an empty block.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

/// MIME type announced for PCM16 audio at `sample_rate`.
pub fn pcm16_mime_type(sample_rate: u32) -> String {
    format!("audio/pcm;rate={sample_rate}")
}

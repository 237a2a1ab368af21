//! Base types for speech synthesis.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::audio::{AudioFrame, CodecError, decode_inbound};

/// Sample rate assumed when the payload's MIME type does not carry one.
pub const DEFAULT_SPEECH_SAMPLE_RATE: u32 = 24000;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while synthesizing or playing speech.
#[derive(Debug, Error)]
pub enum TTSError {
    /// Nothing to speak
    #[error("No text to synthesize")]
    EmptyText,

    /// Backend call failed
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The backend answered without an audio payload
    #[error("Could not generate speech.")]
    NoAudio,

    /// Audio payload could not be decoded
    #[error("Audio decode error: {0}")]
    Decode(#[from] CodecError),

    /// Output device could not be opened or driven
    #[error("Audio device error: {0}")]
    AudioDevice(String),
}

/// Result type for speech operations.
pub type TTSResult<T> = Result<T, TTSError>;

// =============================================================================
// Synthesized Speech
// =============================================================================

/// Base64 PCM16 speech as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedSpeech {
    pub mime_type: String,
    pub data: String,
    pub sample_rate: u32,
}

impl SynthesizedSpeech {
    /// Build from a payload, reading the sample rate from `mime_type`.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        let sample_rate = parse_sample_rate(&mime_type).unwrap_or(DEFAULT_SPEECH_SAMPLE_RATE);
        Self {
            mime_type,
            data: data.into(),
            sample_rate,
        }
    }

    /// Decode to a mono frame.
    pub fn decode(&self) -> TTSResult<AudioFrame> {
        Ok(decode_inbound(&self.data, self.sample_rate, 1)?)
    }
}

/// Extract `rate=<n>` from a MIME type such as `audio/L16;codec=pcm;rate=24000`.
pub fn parse_sample_rate(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("rate"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .filter(|rate| *rate > 0)
}

// =============================================================================
// Synthesizer Trait
// =============================================================================

/// Text to speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> TTSResult<SynthesizedSpeech>;
}

//! Speech synthesis and one-shot playback.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studenflow::core::tts::{GeminiTTS, SpeechPlayer};
//!
//! let tts = Arc::new(GeminiTTS::new(backend));
//! let player = SpeechPlayer::new(tts, device);
//! player.play("Konnichiwa!").await?;
//! ```

mod base;
mod gemini;
mod player;

pub use base::{
    DEFAULT_SPEECH_SAMPLE_RATE, SpeechSynthesizer, SynthesizedSpeech, TTSError, TTSResult,
    parse_sample_rate,
};
pub use gemini::GeminiTTS;
pub use player::{PlaybackOutcome, SpeechPlayer};

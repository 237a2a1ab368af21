//! Realtime voice sessions.
//!
//! # Architecture
//!
//! - `LiveTransport` trait for the wire connection (Gemini Live over WebSocket)
//! - `RealtimeAudioSession` owns the call lifecycle: device acquisition,
//!   microphone streaming, gapless playback and teardown
//! - Audio hardware is reached through `core::audio::AudioDevice`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studenflow::core::audio::{CaptureConfig, CpalAudioDevice};
//! use studenflow::core::realtime::{GeminiLive, LiveSessionConfig, RealtimeAudioSession};
//!
//! let session = RealtimeAudioSession::new(
//!     Arc::new(CpalAudioDevice::new()),
//!     Arc::new(GeminiLive::new(api_key)),
//!     LiveSessionConfig::default(),
//!     CaptureConfig::default(),
//! );
//! session.start().await?;
//! // ...
//! session.stop().await;
//! ```

mod base;
pub mod gemini;
mod session;

pub use base::{
    LiveEvent, LiveSessionConfig, LiveTransport, OutboundAudio, RealtimeError, RealtimeResult,
    SessionState, status,
};
pub use gemini::GeminiLive;
pub use session::RealtimeAudioSession;

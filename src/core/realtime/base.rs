//! Base traits and types for realtime voice sessions.
//!
//! A realtime session streams microphone audio to a live backend and plays
//! the audio it streams back. The backend is reached through the
//! [`LiveTransport`] trait so the session logic is independent of the wire
//! protocol.
//!
//! # Audio Format
//!
//! - Outbound: PCM 16-bit signed little-endian, 16kHz mono, base64
//! - Inbound: PCM 16-bit signed little-endian, 24kHz mono, base64

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::gemini::GeminiVoice;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during realtime operations.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the backend failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Microphone or speaker could not be acquired
    #[error("Audio resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// A session is already running on this client
    #[error("Session busy: {0}")]
    SessionBusy(String),

    /// Not connected
    #[error("Not connected")]
    NotConnected,
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Session State
// =============================================================================

/// Lifecycle of a realtime session.
///
/// `Idle -> Connecting -> Open -> Closing -> Idle`. `Error` is entered from
/// `Connecting` or `Open` and always returns to `Idle` after cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closing,
    Error,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Open => write!(f, "open"),
            SessionState::Closing => write!(f, "closing"),
            SessionState::Error => write!(f, "error"),
        }
    }
}

/// Human-readable status lines shown while a call is in progress.
pub mod status {
    pub const READY: &str = "Ready to call Sensei";
    pub const CONNECTING: &str = "Connecting to Cyber Academy...";
    pub const CONNECTED: &str = "Connected! Speak now.";
    pub const CALL_ENDED: &str = "Call Ended";
    pub const CONNECTION_CLOSED: &str = "Connection Closed";
    pub const CONNECTION_ERROR: &str = "Connection Error";
    pub const START_FAILED: &str = "Failed to access microphone or connect.";
}

// =============================================================================
// Configuration Types
// =============================================================================

/// Parameters sent in the session setup message.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSessionConfig {
    /// Live model identifier
    pub model: String,
    /// Prebuilt voice for spoken replies
    pub voice: GeminiVoice,
    /// System instruction for the session
    pub system_instruction: Option<String>,
    /// Sample rate of inbound audio
    pub output_sample_rate: u32,
}

impl Default for LiveSessionConfig {
    fn default() -> Self {
        Self {
            model: crate::core::gemini::MODEL_LIVE.to_string(),
            voice: GeminiVoice::default(),
            system_instruction: None,
            output_sample_rate: super::gemini::GEMINI_LIVE_OUTPUT_SAMPLE_RATE,
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Events delivered by a live transport, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// Setup acknowledged; audio may flow
    Ready,
    /// A chunk of base64 PCM16 audio
    Audio { mime_type: String, data: String },
    /// The backend cut its own reply short (barge-in)
    Interrupted,
    /// The backend finished a reply
    TurnComplete,
    /// The connection closed
    Closed { reason: Option<String> },
    /// The connection failed
    Error(String),
}

/// One encoded microphone block ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundAudio {
    pub mime_type: String,
    pub data: String,
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Bidirectional connection to a live backend.
///
/// A transport serves one connection at a time. `connect` returns once the
/// socket is up and the setup message is sent; readiness arrives later as
/// [`LiveEvent::Ready`].
#[async_trait]
pub trait LiveTransport: Send + Sync {
    /// Open the connection and send the setup message.
    async fn connect(&self, config: &LiveSessionConfig) -> RealtimeResult<mpsc::Receiver<LiveEvent>>;

    /// Queue an audio block. Never blocks and applies no backpressure.
    fn send_audio(&self, audio: OutboundAudio) -> RealtimeResult<()>;

    /// Close the connection. Safe to call when already closed.
    async fn close(&self) -> RealtimeResult<()>;

    /// Whether the connection is currently up.
    fn is_open(&self) -> bool;
}

//! Gemini Live realtime transport.
//!
//! # Features
//!
//! - WebSocket connection with API key authentication
//! - Setup message with AUDIO modality, prebuilt voice and system instruction
//! - Base64 PCM16 microphone streaming
//! - Inbound audio, interruption and turn-complete events
//! - Close frame on teardown

mod client;
mod config;
mod messages;

pub use client::GeminiLive;
pub use config::{
    GEMINI_LIVE_INPUT_SAMPLE_RATE, GEMINI_LIVE_OUTPUT_SAMPLE_RATE, build_live_url, qualified_model,
};
pub use messages::{ClientMessage, ServerContent, ServerMessage};

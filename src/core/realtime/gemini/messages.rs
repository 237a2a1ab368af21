//! Gemini Live WebSocket message types.
//!
//! # Protocol Overview
//!
//! Client messages (sent to server):
//! - setup - Model, output modality, voice and system instruction; must be first
//! - realtimeInput - Base64 PCM16 microphone chunks
//!
//! Server messages (received from server):
//! - setupComplete - Setup accepted, audio may flow
//! - serverContent - Model turn parts, `interrupted` and `turnComplete` flags
//! - goAway - The server will close the connection soon
//!
//! Server messages are JSON objects whose keys may co-occur, so they are parsed
//! into one struct and then flattened into [`LiveEvent`]s.

use serde::{Deserialize, Serialize};

use crate::core::gemini::{Content, GenerationConfig};
use crate::core::realtime::base::{LiveEvent, OutboundAudio};

// =============================================================================
// Client Messages (sent to server)
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(Setup),
    RealtimeInput(RealtimeInput),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<MediaChunk>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: String,
}

impl ClientMessage {
    /// Wrap one encoded microphone block.
    pub fn audio(audio: OutboundAudio) -> Self {
        ClientMessage::RealtimeInput(RealtimeInput {
            media_chunks: vec![MediaChunk {
                mime_type: audio.mime_type,
                data: audio.data,
            }],
        })
    }
}

// =============================================================================
// Server Messages (received from server)
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default)]
    pub setup_complete: Option<serde_json::Value>,
    #[serde(default)]
    pub server_content: Option<ServerContent>,
    #[serde(default)]
    pub go_away: Option<GoAway>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub model_turn: Option<Content>,
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(default)]
    pub interrupted: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoAway {
    #[serde(default)]
    pub time_left: Option<String>,
}

impl ServerMessage {
    /// Flatten into session events, in protocol order.
    pub fn into_events(self) -> Vec<LiveEvent> {
        let mut events = Vec::new();

        if self.setup_complete.is_some() {
            events.push(LiveEvent::Ready);
        }

        if let Some(content) = self.server_content {
            if content.interrupted {
                events.push(LiveEvent::Interrupted);
            }
            if let Some(turn) = content.model_turn {
                events.extend(turn.parts.into_iter().filter_map(|part| {
                    part.inline_data.map(|inline| LiveEvent::Audio {
                        mime_type: inline.mime_type,
                        data: inline.data,
                    })
                }));
            }
            if content.turn_complete {
                events.push(LiveEvent::TurnComplete);
            }
        }

        events
    }
}

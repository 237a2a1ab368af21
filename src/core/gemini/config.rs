//! Configuration types for the Gemini API.
//!
//! This module contains:
//! - Endpoint constants
//! - Default model identifiers for each use
//! - Prebuilt voice selection
//! - Response modalities

use serde::{Deserialize, Serialize};

/// Base URL of the Generative Language REST API.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Bidirectional streaming endpoint used by Live sessions.
pub const GEMINI_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Header carrying the API key on REST calls.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

// =============================================================================
// Default Models
// =============================================================================

/// High-quality model, also used for image questions.
pub const MODEL_HIGH_QUALITY: &str = "gemini-3-pro-preview";
/// Balanced model for text-only questions and search grounding.
pub const MODEL_BALANCED: &str = "gemini-2.5-flash";
/// Low-latency chat model.
pub const MODEL_LITE: &str = "gemini-2.5-flash-lite";
/// Speech synthesis model.
pub const MODEL_TTS: &str = "gemini-2.5-flash-preview-tts";
/// Native-audio model for Live sessions.
pub const MODEL_LIVE: &str = "gemini-2.5-flash-native-audio-preview-09-2025";

// =============================================================================
// Voices
// =============================================================================

/// Prebuilt voices accepted by speech and Live models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeminiVoice {
    #[default]
    Kore,
    Puck,
    Charon,
    Fenrir,
    Aoede,
    Leda,
    Orus,
    Zephyr,
}

impl GeminiVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kore => "Kore",
            Self::Puck => "Puck",
            Self::Charon => "Charon",
            Self::Fenrir => "Fenrir",
            Self::Aoede => "Aoede",
            Self::Leda => "Leda",
            Self::Orus => "Orus",
            Self::Zephyr => "Zephyr",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "kore" => Self::Kore,
            "puck" => Self::Puck,
            "charon" => Self::Charon,
            "fenrir" => Self::Fenrir,
            "aoede" => Self::Aoede,
            "leda" => Self::Leda,
            "orus" => Self::Orus,
            "zephyr" => Self::Zephyr,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for GeminiVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Modalities
// =============================================================================

/// Output modality requested from a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseModality {
    Text,
    Audio,
}

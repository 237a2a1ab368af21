//! Gemini API integration: configuration, wire types and the HTTP client.

pub mod client;
pub mod config;
pub mod messages;

pub use client::{GeminiClient, GeminiClientConfig, GeminiError, GeminiResult, GenerativeBackend};
pub use config::{
    API_KEY_HEADER, GEMINI_API_BASE_URL, GEMINI_LIVE_URL, GeminiVoice, MODEL_BALANCED,
    MODEL_HIGH_QUALITY, MODEL_LITE, MODEL_LIVE, MODEL_TTS, ResponseModality,
};
pub use messages::{
    Candidate, Citation, Content, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, InlineData, Part, SpeechConfig, Tool,
};

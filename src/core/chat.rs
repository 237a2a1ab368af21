//! Chat session state.
//!
//! A [`ChatSession`] owns an ordered, append-only conversation and one active
//! [`Mode`]. Each `send` replays the whole prior conversation to the backend
//! with the new message, so the backend stays stateless. A failed request
//! never loses history: the user turn stays and a fixed apology turn follows.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use super::gemini::{
    Citation, Content, GenerateContentRequest, GenerativeBackend, MODEL_BALANCED,
    MODEL_HIGH_QUALITY, MODEL_LITE, Tool,
};
use super::prompts::{CHAT_FAILURE_REPLY, CHAT_GREETING, CHAT_INSTRUCTION};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    /// Message was empty or whitespace
    #[error("Message is empty")]
    EmptyMessage,
}

// =============================================================================
// Mode
// =============================================================================

/// Backend profile for future turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Strongest model
    #[default]
    HighQuality,
    /// Lowest-latency model
    Fast,
    /// Web-search grounded answers with citations
    SearchGrounded,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighQuality => "smart",
            Self::Fast => "lite",
            Self::SearchGrounded => "search",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "smart" | "high-quality" | "high_quality" | "pro" => Self::HighQuality,
            "lite" | "fast" => Self::Fast,
            "search" | "search-grounded" | "grounded" => Self::SearchGrounded,
            _ => Self::default(),
        }
    }

    pub fn uses_search(&self) -> bool {
        matches!(self, Self::SearchGrounded)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Model used for each mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatModels {
    pub high_quality: String,
    pub fast: String,
    pub search: String,
}

impl Default for ChatModels {
    fn default() -> Self {
        Self {
            high_quality: MODEL_HIGH_QUALITY.to_string(),
            fast: MODEL_LITE.to_string(),
            search: MODEL_BALANCED.to_string(),
        }
    }
}

impl ChatModels {
    pub fn for_mode(&self, mode: Mode) -> &str {
        match mode {
            Mode::HighQuality => &self.high_quality,
            Mode::Fast => &self.fast,
            Mode::SearchGrounded => &self.search,
        }
    }
}

// =============================================================================
// Conversation
// =============================================================================

/// One entry of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationTurn {
    User { text: String },
    Model { text: String },
    GroundedModel { text: String, citations: Vec<Citation> },
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::Model { text: text.into() }
    }

    /// Wire role, `user` or `model`.
    pub fn role(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Model { .. } | Self::GroundedModel { .. } => "model",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::User { text } | Self::Model { text } | Self::GroundedModel { text, .. } => text,
        }
    }

    pub fn citations(&self) -> &[Citation] {
        match self {
            Self::GroundedModel { citations, .. } => citations,
            _ => &[],
        }
    }

    fn to_content(&self) -> Content {
        match self {
            Self::User { text } => Content::user_text(text.as_str()),
            _ => Content::model_text(self.text()),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

pub struct ChatSession {
    backend: Arc<dyn GenerativeBackend>,
    models: ChatModels,
    mode: Mode,
    history: Vec<ConversationTurn>,
}

impl ChatSession {
    /// Empty conversation in the default mode.
    pub fn new(backend: Arc<dyn GenerativeBackend>, models: ChatModels) -> Self {
        Self {
            backend,
            models,
            mode: Mode::default(),
            history: Vec::new(),
        }
    }

    /// Conversation opened by the greeting turn.
    pub fn with_greeting(backend: Arc<dyn GenerativeBackend>, models: ChatModels) -> Self {
        let mut session = Self::new(backend, models);
        session.history.push(ConversationTurn::model(CHAT_GREETING));
        session
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch mode for future turns. Past turns are untouched.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            debug!("Chat mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    fn build_request(&self, mode: Mode) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.history.iter().map(ConversationTurn::to_content).collect(),
            system_instruction: Some(Content::system(CHAT_INSTRUCTION)),
            generation_config: None,
            tools: mode.uses_search().then(|| vec![Tool::google_search()]),
        }
    }

    /// Send `message` and append the reply.
    ///
    /// Blank input is rejected before any request. Any backend failure is
    /// absorbed into a fixed apology turn, so the returned turn is always the
    /// last entry of the history.
    pub async fn send(&mut self, message: &str) -> Result<&ConversationTurn, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let mode = self.mode;
        self.history.push(ConversationTurn::user(message));
        let request = self.build_request(mode);
        let model = self.models.for_mode(mode);

        let reply = match self.backend.generate_content(model, &request).await {
            Ok(response) => {
                let text = response.text();
                let citations = response.citations();
                if mode.uses_search() && !citations.is_empty() {
                    ConversationTurn::GroundedModel { text, citations }
                } else {
                    ConversationTurn::model(text)
                }
            }
            Err(e) => {
                error!("Chat request failed ({} via {}): {}", mode, model, e);
                ConversationTurn::model(CHAT_FAILURE_REPLY)
            }
        };

        self.history.push(reply);
        // Just pushed, never empty
        Ok(&self.history[self.history.len() - 1])
    }
}

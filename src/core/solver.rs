//! Question solving.
//!
//! A question is text, an image, or both. Image questions go to the
//! high-quality model, text-only questions to the balanced one. The answer is
//! split into formal and supplementary sections by the injected
//! [`ResponseSplitter`].

use std::path::Path;
use std::sync::Arc;

use base64::prelude::*;
use thiserror::Error;
use tracing::{error, info};

use super::gemini::{
    Content, GeminiError, GenerateContentRequest, GenerationConfig, GenerativeBackend,
    MODEL_BALANCED, MODEL_HIGH_QUALITY, Part,
};
use super::prompts::{SOLVER_EMPTY_RESPONSE, SOLVER_INSTRUCTION};
use super::splitter::{MarkerSplitter, ResponseSplitter, SolutionDocument};

#[derive(Debug, Error)]
pub enum SolveError {
    /// Neither text nor image was given
    #[error("Please provide text or an image.")]
    EmptyQuestion,

    /// Image file could not be read
    #[error("Failed to read image: {0}")]
    Image(String),

    /// The backend call failed
    #[error("Failed to consult the Cyber Academy database! Please try again.")]
    Backend(#[source] GeminiError),
}

// =============================================================================
// Question
// =============================================================================

/// Raw image bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read an image file, guessing the MIME type from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SolveError> {
        let path = path.as_ref();
        let mime_type = mime_type_for(path).ok_or_else(|| {
            SolveError::Image(format!("unsupported image type: {}", path.display()))
        })?;
        let bytes = std::fs::read(path)
            .map_err(|e| SolveError::Image(format!("{}: {e}", path.display())))?;
        Ok(Self::new(mime_type, bytes))
    }

    fn to_part(&self) -> Part {
        Part::inline(self.mime_type.clone(), BASE64_STANDARD.encode(&self.bytes))
    }
}

fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

/// A question to solve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Question {
    pub text: Option<String>,
    pub image: Option<ImageAttachment>,
}

impl Question {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    fn text_part(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Image first, then text.
    fn parts(&self) -> Vec<Part> {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &self.image {
            parts.push(image.to_part());
        }
        if let Some(text) = self.text_part() {
            parts.push(Part::text(text));
        }
        parts
    }
}

// =============================================================================
// Solver
// =============================================================================

/// Model selection and sampling for solving.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    /// Model for questions with an image
    pub image_model: String,
    /// Model for text-only questions
    pub text_model: String,
    pub temperature: f32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            image_model: MODEL_HIGH_QUALITY.to_string(),
            text_model: MODEL_BALANCED.to_string(),
            temperature: 0.7,
        }
    }
}

pub struct Solver {
    backend: Arc<dyn GenerativeBackend>,
    splitter: Arc<dyn ResponseSplitter>,
    settings: SolverSettings,
}

impl Solver {
    pub fn new(backend: Arc<dyn GenerativeBackend>, settings: SolverSettings) -> Self {
        Self {
            backend,
            splitter: Arc::new(MarkerSplitter::default()),
            settings,
        }
    }

    pub fn with_splitter(mut self, splitter: Arc<dyn ResponseSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    /// Model a question will be sent to.
    pub fn model_for(&self, question: &Question) -> &str {
        if question.image.is_some() {
            &self.settings.image_model
        } else {
            &self.settings.text_model
        }
    }

    pub async fn solve(&self, question: &Question) -> Result<SolutionDocument, SolveError> {
        let parts = question.parts();
        if parts.is_empty() {
            return Err(SolveError::EmptyQuestion);
        }

        let model = self.model_for(question);
        let request = GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: Some(Content::system(SOLVER_INSTRUCTION)),
            generation_config: Some(GenerationConfig {
                temperature: Some(self.settings.temperature),
                ..Default::default()
            }),
            tools: None,
        };

        info!(
            "Solving question (image: {}) with {}",
            question.image.is_some(),
            model
        );
        let response = self
            .backend
            .generate_content(model, &request)
            .await
            .map_err(|e| {
                error!("Solver request failed: {}", e);
                SolveError::Backend(e)
            })?;

        let mut text = response.text();
        if text.is_empty() {
            text = SOLVER_EMPTY_RESPONSE.to_string();
        }
        Ok(self.splitter.split(&text))
    }
}

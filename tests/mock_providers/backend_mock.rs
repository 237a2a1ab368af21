//! Canned generative backend

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use studenflow::core::gemini::{
    GeminiError, GeminiResult, GenerateContentRequest, GenerateContentResponse, GenerativeBackend,
};

/// A recorded call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub request: GenerateContentRequest,
}

/// Backend that replays queued results in order and records every call.
#[derive(Default)]
pub struct MockBackend {
    responses: Mutex<VecDeque<GeminiResult<GenerateContentResponse>>>,
    delay: Option<Duration>,
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push_json(&self, body: Value) -> &Self {
        let response = serde_json::from_value(body).expect("valid response fixture");
        self.responses.lock().push_back(Ok(response));
        self
    }

    pub fn push_text(&self, text: &str) -> &Self {
        self.push_json(text_response(text))
    }

    pub fn push_error(&self, error: GeminiError) -> &Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        self.calls.lock().push(RecordedCall {
            model: model.to_string(),
            request: request.clone(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GeminiError::Network("no canned response".to_string())))
    }
}

/// Response body with one text part.
pub fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

/// Response body with one inline audio part.
pub fn audio_response(mime_type: &str, data: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "inlineData": { "mimeType": mime_type, "data": data } }]
            }
        }]
    })
}

//! Gemini speech synthesis.
//!
//! Uses `generateContent` on a TTS model with AUDIO output and a prebuilt
//! voice. The first inline payload of the first candidate is the speech.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::base::{SpeechSynthesizer, SynthesizedSpeech, TTSError, TTSResult};
use crate::core::gemini::{
    Content, GeminiVoice, GenerateContentRequest, GenerationConfig, GenerativeBackend, MODEL_TTS,
};

pub struct GeminiTTS {
    backend: Arc<dyn GenerativeBackend>,
    model: String,
    voice: GeminiVoice,
}

impl GeminiTTS {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            model: MODEL_TTS.to_string(),
            voice: GeminiVoice::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: GeminiVoice) -> Self {
        self.voice = voice;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn voice(&self) -> GeminiVoice {
        self.voice
    }

    fn build_request(&self, text: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user_text(text)],
            generation_config: Some(GenerationConfig::audio(self.voice)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiTTS {
    async fn synthesize(&self, text: &str) -> TTSResult<SynthesizedSpeech> {
        if text.trim().is_empty() {
            return Err(TTSError::EmptyText);
        }

        let response = self
            .backend
            .generate_content(&self.model, &self.build_request(text))
            .await
            .map_err(|e| TTSError::ProviderError(e.to_string()))?;

        let inline = response.first_inline_data().ok_or(TTSError::NoAudio)?;
        if inline.data.is_empty() {
            return Err(TTSError::NoAudio);
        }

        let speech = SynthesizedSpeech::new(inline.mime_type.clone(), inline.data.clone());
        debug!(
            "Synthesized {} base64 bytes of speech at {}Hz with voice {}",
            speech.data.len(),
            speech.sample_rate,
            self.voice
        );
        Ok(speech)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gemini::{GeminiResult, GenerateContentResponse};
    use parking_lot::Mutex;
    use serde_json::json;

    struct CannedBackend {
        response: serde_json::Value,
        requests: Mutex<Vec<(String, GenerateContentRequest)>>,
    }

    #[async_trait]
    impl GenerativeBackend for CannedBackend {
        async fn generate_content(
            &self,
            model: &str,
            request: &GenerateContentRequest,
        ) -> GeminiResult<GenerateContentResponse> {
            self.requests.lock().push((model.to_string(), request.clone()));
            Ok(serde_json::from_value(self.response.clone()).unwrap())
        }
    }

    fn backend(response: serde_json::Value) -> Arc<CannedBackend> {
        Arc::new(CannedBackend {
            response,
            requests: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_synthesize_returns_first_inline_payload() {
        let backend = backend(json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAAAAA=="}}
            ]}}]
        }));
        let tts = GeminiTTS::new(backend.clone());

        let speech = tts.synthesize("Hello Sensei").await.unwrap();
        assert_eq!(speech.data, "AAAAAA==");
        assert_eq!(speech.sample_rate, 24000);

        let requests = backend.requests.lock();
        let (model, request) = &requests[0];
        assert_eq!(model, "gemini-2.5-flash-preview-tts");
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello Sensei");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Kore"
        );
    }

    #[tokio::test]
    async fn test_synthesize_without_audio_fails() {
        let tts = GeminiTTS::new(backend(json!({
            "candidates": [{"content": {"parts": [{"text": "no audio here"}]}}]
        })));

        match tts.synthesize("Hello").await {
            Err(TTSError::NoAudio) => {}
            other => panic!("Expected NoAudio, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_synthesize_rejects_blank_text() {
        let backend = backend(json!({}));
        let tts = GeminiTTS::new(backend.clone()).with_voice(GeminiVoice::Puck);

        assert!(matches!(tts.synthesize("   ").await, Err(TTSError::EmptyText)));
        assert!(backend.requests.lock().is_empty());
        assert_eq!(tts.voice(), GeminiVoice::Puck);
    }
}

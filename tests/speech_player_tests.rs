//! Integration tests for one-shot speech playback
//!
//! These tests verify:
//! - Synthesis request shape for the TTS model
//! - Playback on a fresh output context that is closed afterwards
//! - A new clip replaces the active one
//! - Stop and toggle cancel synthesis or playback
//! - Responses without audio surface a readable error

mod fixtures;
mod mock_providers;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;

use fixtures::output_chunk;
use mock_providers::{MockAudioDevice, MockBackend, audio_response, wait_until};
use studenflow::core::audio::PlaybackSink;
use studenflow::core::gemini::{GeminiError, GeminiVoice};
use studenflow::core::tts::{GeminiTTS, PlaybackOutcome, SpeechPlayer, SpeechSynthesizer, TTSError};

const WAIT: Duration = Duration::from_secs(3);
const SPEECH_MIME: &str = "audio/L16;codec=pcm;rate=24000";

struct Harness {
    backend: Arc<MockBackend>,
    device: Arc<MockAudioDevice>,
    player: Arc<SpeechPlayer>,
}

impl Harness {
    fn with_backend(backend: MockBackend) -> Self {
        let backend = Arc::new(backend);
        let device = Arc::new(MockAudioDevice::new());
        let tts = Arc::new(GeminiTTS::new(backend.clone()));
        let player = Arc::new(SpeechPlayer::new(tts, device.clone()));
        Self {
            backend,
            device,
            player,
        }
    }

    fn new() -> Self {
        Self::with_backend(MockBackend::new())
    }

    fn queue_speech(&self, seconds: f64) {
        self.backend
            .push_json(audio_response(SPEECH_MIME, &output_chunk(seconds)));
    }

    fn spawn_play(&self, text: &'static str) -> tokio::task::JoinHandle<Result<PlaybackOutcome, TTSError>> {
        let player = self.player.clone();
        tokio::spawn(async move { player.play(text).await })
    }
}

#[tokio::test]
async fn test_synthesis_request() {
    let backend = Arc::new(MockBackend::new());
    backend.push_json(audio_response(SPEECH_MIME, &output_chunk(0.1)));

    let tts = GeminiTTS::new(backend.clone()).with_voice(GeminiVoice::Charon);
    let speech = tts.synthesize("Konnichiwa!").await.unwrap();
    assert_eq!(speech.sample_rate, 24000);
    assert_eq!(speech.decode().unwrap().samples.len(), 2400);

    let call = backend.last_call().unwrap();
    assert_eq!(call.model, "gemini-2.5-flash-preview-tts");
    assert_eq!(call.request.contents[0].parts[0].text.as_deref(), Some("Konnichiwa!"));

    let config = serde_json::to_value(call.request.generation_config.unwrap()).unwrap();
    assert_eq!(config["responseModalities"], json!(["AUDIO"]));
    assert_eq!(
        config["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
        "Charon"
    );
}

#[tokio::test]
async fn test_play_to_completion() {
    let h = Harness::new();
    h.queue_speech(0.1);

    let outcome = h.player.play("A stack is LIFO.").await.unwrap();
    assert_eq!(outcome, PlaybackOutcome::Finished);
    assert!(!h.player.is_playing());

    let playback = h.device.last_playback().unwrap();
    assert_eq!(playback.sample_rate(), 24000);
    let clips = playback.clips();
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0].samples, 2400);
    assert_eq!(clips[0].start, 0.0);
    assert!(playback.is_closed());
}

#[tokio::test]
async fn test_new_clip_replaces_active_one() {
    let h = Harness::new();
    h.queue_speech(2.0);
    h.queue_speech(0.05);

    let first = h.spawn_play("long explanation");
    assert!(wait_until(WAIT, || h.device.playbacks_opened.load(Ordering::SeqCst) == 1).await);
    let first_playback = h.device.last_playback().unwrap();

    let second = h.player.play("short").await.unwrap();
    assert_eq!(second, PlaybackOutcome::Finished);
    assert_eq!(first.await.unwrap().unwrap(), PlaybackOutcome::Cancelled);

    assert_eq!(first_playback.stop_all_calls.load(Ordering::SeqCst), 1);
    assert!(first_playback.is_closed());
    assert_eq!(h.device.open_playbacks(), 0);
    assert!(!h.player.is_playing());
}

#[tokio::test]
async fn test_stop_cancels_playback() {
    let h = Harness::new();
    h.queue_speech(2.0);

    let play = h.spawn_play("something long");
    assert!(wait_until(WAIT, || h.device.playbacks_opened.load(Ordering::SeqCst) == 1).await);
    assert!(h.player.is_playing());

    h.player.stop();
    assert_eq!(play.await.unwrap().unwrap(), PlaybackOutcome::Cancelled);
    assert!(!h.player.is_playing());
    assert!(h.device.last_playback().unwrap().is_closed());

    // Stopping again is a no-op.
    h.player.stop();
}

#[tokio::test]
async fn test_aborted_play_releases_output() {
    let h = Harness::new();
    h.queue_speech(5.0);
    h.queue_speech(0.05);

    let play = h.spawn_play("a very long lecture");
    assert!(wait_until(WAIT, || h.device.playbacks_opened.load(Ordering::SeqCst) == 1).await);
    let playback = h.device.last_playback().unwrap();

    play.abort();
    assert!(play.await.unwrap_err().is_cancelled());

    assert!(!h.player.is_playing());
    assert!(playback.is_closed());
    assert_eq!(playback.stop_all_calls.load(Ordering::SeqCst), 1);

    // The player is idle again, so toggle plays instead of stopping.
    let outcome = h.player.toggle("next").await.unwrap();
    assert_eq!(outcome, PlaybackOutcome::Finished);
    assert_eq!(h.device.playbacks_opened.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timed_out_play_leaves_player_idle() {
    let h = Harness::with_backend(MockBackend::with_delay(Duration::from_millis(500)));
    h.queue_speech(0.1);

    let result = tokio::time::timeout(Duration::from_millis(50), h.player.play("slow")).await;
    assert!(result.is_err());
    assert!(!h.player.is_playing());
    assert_eq!(h.device.playbacks_opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stop_during_synthesis() {
    let h = Harness::with_backend(MockBackend::with_delay(Duration::from_millis(500)));
    h.queue_speech(0.1);

    let play = h.spawn_play("slow backend");
    assert!(wait_until(WAIT, || h.backend.calls().len() == 1).await);

    h.player.stop();
    assert_eq!(play.await.unwrap().unwrap(), PlaybackOutcome::Cancelled);
    assert_eq!(h.device.playbacks_opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_toggle() {
    let h = Harness::new();
    h.queue_speech(2.0);

    let player = h.player.clone();
    let play = tokio::spawn(async move { player.toggle("read this").await });
    assert!(wait_until(WAIT, || h.device.playbacks_opened.load(Ordering::SeqCst) == 1).await);

    let outcome = h.player.toggle("read this").await.unwrap();
    assert_eq!(outcome, PlaybackOutcome::Cancelled);
    assert_eq!(play.await.unwrap().unwrap(), PlaybackOutcome::Cancelled);
    assert_eq!(h.backend.calls().len(), 1);
}

#[tokio::test]
async fn test_response_without_audio() {
    let h = Harness::new();
    h.backend.push_text("I can only type, sorry!");

    let err = h.player.play("hello").await.unwrap_err();
    assert!(matches!(err, TTSError::NoAudio));
    assert_eq!(err.to_string(), "Could not generate speech.");
    assert_eq!(h.device.playbacks_opened.load(Ordering::SeqCst), 0);
    assert!(!h.player.is_playing());
}

#[tokio::test]
async fn test_backend_failure() {
    let h = Harness::new();
    h.backend
        .push_error(GeminiError::AuthenticationFailed("bad key".to_string()));

    let err = h.player.play("hello").await.unwrap_err();
    assert!(matches!(err, TTSError::ProviderError(_)));
}

#[tokio::test]
async fn test_blank_text() {
    let h = Harness::new();
    let err = h.player.play("   ").await.unwrap_err();
    assert!(matches!(err, TTSError::EmptyText));
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn test_corrupt_audio_payload() {
    let h = Harness::new();
    h.backend.push_json(audio_response(SPEECH_MIME, "AA=="));

    let err = h.player.play("hello").await.unwrap_err();
    assert!(matches!(err, TTSError::Decode(_)));
    assert_eq!(h.device.playbacks_opened.load(Ordering::SeqCst), 0);
}

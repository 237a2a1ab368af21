//! One-shot speech playback.
//!
//! A [`SpeechPlayer`] plays at most one clip at a time. Starting a new clip
//! cancels the active one outright; there is no queue. Each clip gets its own
//! output context, released as soon as the clip ends or is cancelled, or when
//! the `play` future is dropped before either happens.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::base::{SpeechSynthesizer, TTSError, TTSResult};
use crate::core::audio::{AudioDevice, PlaybackSink};

/// How a `play` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The clip played to the end
    Finished,
    /// `stop` or a newer `play` cut it short
    Cancelled,
}

struct ActivePlayback {
    id: u64,
    cancel: CancellationToken,
}

/// Owns one `play` call's slot and output context.
///
/// Dropping it clears the slot (if still ours) and releases the output, so an
/// aborted or timed-out `play` leaves the player idle.
struct PlaybackGuard<'a> {
    active: &'a Mutex<Option<ActivePlayback>>,
    id: u64,
    sink: Option<Arc<dyn PlaybackSink>>,
}

impl Drop for PlaybackGuard<'_> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop_all();
            sink.close();
        }
        let mut active = self.active.lock();
        if active.as_ref().map(|a| a.id) == Some(self.id) {
            *active = None;
        }
    }
}

pub struct SpeechPlayer {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    device: Arc<dyn AudioDevice>,
    active: Mutex<Option<ActivePlayback>>,
    next_id: AtomicU64,
}

impl SpeechPlayer {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, device: Arc<dyn AudioDevice>) -> Self {
        Self {
            synthesizer,
            device,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Whether a clip is being synthesized or played.
    pub fn is_playing(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Cancel the active clip, if any.
    pub fn stop(&self) {
        if let Some(active) = self.active.lock().take() {
            debug!("Stopping speech playback {}", active.id);
            active.cancel.cancel();
        }
    }

    /// Stop if playing, otherwise play `text`.
    pub async fn toggle(&self, text: &str) -> TTSResult<PlaybackOutcome> {
        if self.is_playing() {
            self.stop();
            return Ok(PlaybackOutcome::Cancelled);
        }
        self.play(text).await
    }

    /// Synthesize `text` and play it once, replacing any active clip.
    pub async fn play(&self, text: &str) -> TTSResult<PlaybackOutcome> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        let previous = self.active.lock().replace(ActivePlayback {
            id,
            cancel: cancel.clone(),
        });
        if let Some(previous) = previous {
            debug!("Speech playback {} replaced by {}", previous.id, id);
            previous.cancel.cancel();
        }

        let mut guard = PlaybackGuard {
            active: &self.active,
            id,
            sink: None,
        };
        self.run(text, &cancel, &mut guard).await
    }

    async fn run(
        &self,
        text: &str,
        cancel: &CancellationToken,
        guard: &mut PlaybackGuard<'_>,
    ) -> TTSResult<PlaybackOutcome> {
        let speech = tokio::select! {
            _ = cancel.cancelled() => return Ok(PlaybackOutcome::Cancelled),
            speech = self.synthesizer.synthesize(text) => speech?,
        };
        if cancel.is_cancelled() {
            return Ok(PlaybackOutcome::Cancelled);
        }

        let frame = speech.decode()?;
        let duration = frame.duration_secs();

        let sink = self
            .device
            .open_playback(frame.sample_rate, frame.channels)
            .await
            .map_err(|e| TTSError::AudioDevice(e.to_string()))?;
        guard.sink = Some(sink.clone());

        let start = sink.current_time();
        sink.schedule(frame, start).map_err(|e| TTSError::AudioDevice(e.to_string()))?;
        info!("Playing {:.2}s of speech", duration);

        let outcome = tokio::select! {
            _ = cancel.cancelled() => PlaybackOutcome::Cancelled,
            _ = tokio::time::sleep(Duration::from_secs_f64(duration)) => PlaybackOutcome::Finished,
        };
        Ok(outcome)
    }
}

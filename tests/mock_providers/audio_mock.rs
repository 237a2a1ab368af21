//! Mock audio hardware
//!
//! The output clock only moves when a test calls [`MockPlayback::advance`],
//! so scheduling decisions are fully deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use studenflow::core::audio::{
    AudioDevice, AudioDeviceError, AudioDeviceResult, AudioFrame, CaptureConfig, CaptureStream,
    PlaybackSink,
};

/// One scheduled clip as seen by the output context.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledClip {
    pub start: f64,
    pub duration: f64,
    pub samples: usize,
}

// =============================================================================
// Playback
// =============================================================================

pub struct MockPlayback {
    sample_rate: u32,
    clock: Mutex<f64>,
    pub scheduled: Mutex<Vec<ScheduledClip>>,
    pub stop_all_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
}

impl MockPlayback {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            clock: Mutex::new(0.0),
            scheduled: Mutex::new(Vec::new()),
            stop_all_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_time(&self, seconds: f64) {
        *self.clock.lock() = seconds;
    }

    pub fn advance(&self, seconds: f64) {
        *self.clock.lock() += seconds;
    }

    pub fn clips(&self) -> Vec<ScheduledClip> {
        self.scheduled.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.close_calls.load(Ordering::SeqCst) > 0
    }
}

impl PlaybackSink for MockPlayback {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        *self.clock.lock()
    }

    fn schedule(&self, frame: AudioFrame, start_at: f64) -> AudioDeviceResult<()> {
        if self.is_closed() {
            return Err(AudioDeviceError::Closed);
        }
        self.scheduled.lock().push(ScheduledClip {
            start: start_at,
            duration: frame.duration_secs(),
            samples: frame.samples.len(),
        });
        Ok(())
    }

    fn stop_all(&self) {
        self.stop_all_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Capture
// =============================================================================

struct MockCapture {
    blocks: Option<mpsc::Receiver<AudioFrame>>,
    stopped: Arc<AtomicUsize>,
}

impl CaptureStream for MockCapture {
    fn take_blocks(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
        self.blocks.take()
    }

    fn stop(&mut self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Device
// =============================================================================

/// Device whose microphone is fed by the test through [`MockAudioDevice::push_block`].
pub struct MockAudioDevice {
    deny_capture: AtomicBool,
    deny_playback: AtomicBool,
    block_tx: Mutex<Option<mpsc::Sender<AudioFrame>>>,
    capture_config: Mutex<Option<CaptureConfig>>,
    open_delay: Option<Duration>,
    pub captures_opened: AtomicUsize,
    pub captures_stopped: Arc<AtomicUsize>,
    pub playbacks_opened: AtomicUsize,
    playbacks: Mutex<Vec<Arc<MockPlayback>>>,
}

impl Default for MockAudioDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAudioDevice {
    pub fn new() -> Self {
        Self {
            deny_capture: AtomicBool::new(false),
            deny_playback: AtomicBool::new(false),
            block_tx: Mutex::new(None),
            capture_config: Mutex::new(None),
            open_delay: None,
            captures_opened: AtomicUsize::new(0),
            captures_stopped: Arc::new(AtomicUsize::new(0)),
            playbacks_opened: AtomicUsize::new(0),
            playbacks: Mutex::new(Vec::new()),
        }
    }

    /// Device whose microphone permission is refused.
    pub fn denying_microphone() -> Self {
        let device = Self::new();
        device.deny_capture.store(true, Ordering::SeqCst);
        device
    }

    /// Device that takes `delay` to start each stream, like real hardware.
    pub fn with_open_delay(delay: Duration) -> Self {
        Self {
            open_delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn deny_playback(&self) {
        self.deny_playback.store(true, Ordering::SeqCst);
    }

    /// Most recently opened output context.
    pub fn last_playback(&self) -> Option<Arc<MockPlayback>> {
        self.playbacks.lock().last().cloned()
    }

    /// Output contexts opened but not closed.
    pub fn open_playbacks(&self) -> usize {
        self.playbacks
            .lock()
            .iter()
            .filter(|p| !p.is_closed())
            .count()
    }

    /// Capture streams opened but not stopped.
    pub fn open_captures(&self) -> usize {
        self.captures_opened
            .load(Ordering::SeqCst)
            .saturating_sub(self.captures_stopped.load(Ordering::SeqCst))
    }

    /// Format requested by the most recent `open_capture`.
    pub fn last_capture_config(&self) -> Option<CaptureConfig> {
        *self.capture_config.lock()
    }

    /// Feed one microphone block at the requested capture rate. Returns false when no capture is open.
    pub async fn push_block(&self, samples: Vec<f32>) -> bool {
        let tx = self.block_tx.lock().clone();
        let sample_rate = self.last_capture_config().map_or(16000, |c| c.sample_rate);
        match tx {
            Some(tx) => tx.send(AudioFrame::mono(samples, sample_rate)).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl AudioDevice for MockAudioDevice {
    async fn open_capture(&self, config: &CaptureConfig) -> AudioDeviceResult<Box<dyn CaptureStream>> {
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        if self.deny_capture.load(Ordering::SeqCst) {
            return Err(AudioDeviceError::PermissionDenied(
                "microphone access denied".to_string(),
            ));
        }
        *self.capture_config.lock() = Some(*config);

        let (tx, rx) = mpsc::channel(16);
        *self.block_tx.lock() = Some(tx);
        self.captures_opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockCapture {
            blocks: Some(rx),
            stopped: self.captures_stopped.clone(),
        }))
    }

    async fn open_playback(
        &self,
        sample_rate: u32,
        _channels: u16,
    ) -> AudioDeviceResult<Arc<dyn PlaybackSink>> {
        if self.deny_playback.load(Ordering::SeqCst) {
            return Err(AudioDeviceError::NoDevice("no output device".to_string()));
        }
        let playback = Arc::new(MockPlayback::new(sample_rate));
        self.playbacks.lock().push(playback.clone());
        self.playbacks_opened.fetch_add(1, Ordering::SeqCst);
        Ok(playback)
    }
}

//! Audio device seam.
//!
//! The realtime session and the speech player talk to audio hardware only
//! through these traits. The `device-audio` feature provides a cpal backed
//! implementation; tests substitute in-memory devices.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::codec::AudioFrame;

/// Errors raised while acquiring or driving an audio device.
#[derive(Debug, Error)]
pub enum AudioDeviceError {
    /// The user or the OS refused access to the device
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// No suitable device is present
    #[error("No audio device: {0}")]
    NoDevice(String),

    /// The device exists but the stream could not be built or started
    #[error("Audio stream failed: {0}")]
    StreamFailed(String),

    /// Frame format does not match the opened stream
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The resource was already released
    #[error("Audio device closed")]
    Closed,
}

/// Result type for audio device operations.
pub type AudioDeviceResult<T> = Result<T, AudioDeviceError>;

/// Microphone capture parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Sample rate delivered to the caller
    pub sample_rate: u32,
    /// Channels delivered to the caller
    pub channels: u16,
    /// Samples per delivered block
    pub block_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            block_size: 4096,
        }
    }
}

/// An open microphone stream delivering fixed-size blocks.
pub trait CaptureStream: Send {
    /// Hand over the block receiver. Only the first call returns `Some`.
    fn take_blocks(&mut self) -> Option<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing and release the device. Safe to call more than once.
    fn stop(&mut self);
}

/// An open output context with its own monotonically increasing clock.
pub trait PlaybackSink: Send + Sync {
    /// Output sample rate of the context.
    fn sample_rate(&self) -> u32;

    /// Current position of the output clock in seconds.
    fn current_time(&self) -> f64;

    /// Queue `frame` to start at `start_at` seconds on the output clock.
    fn schedule(&self, frame: AudioFrame, start_at: f64) -> AudioDeviceResult<()>;

    /// Silence everything queued. The context stays usable.
    fn stop_all(&self);

    /// Release the output device. Safe to call more than once.
    fn close(&self);
}

/// Factory for capture streams and output contexts.
///
/// Opening waits for the device to start, so implementations that block on
/// hardware must do so off the async runtime.
#[async_trait]
pub trait AudioDevice: Send + Sync {
    async fn open_capture(&self, config: &CaptureConfig) -> AudioDeviceResult<Box<dyn CaptureStream>>;

    async fn open_playback(
        &self,
        sample_rate: u32,
        channels: u16,
    ) -> AudioDeviceResult<Arc<dyn PlaybackSink>>;
}

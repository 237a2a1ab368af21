//! System audio through cpal.
//!
//! Each cpal stream is owned by a dedicated thread for its whole life, so the
//! handles returned to async code are plain channels and shared state. The
//! thread exits and drops its stream when the stop channel is closed.
//!
//! Capture records at the device's native format, mixes down to mono,
//! resamples to the requested rate and re-frames into fixed-size blocks.
//! Playback mixes scheduled frames against a sample-count clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread;

use async_trait::async_trait;
use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use super::codec::AudioFrame;
use super::device::{
    AudioDevice, AudioDeviceError, AudioDeviceResult, CaptureConfig, CaptureStream, PlaybackSink,
};

/// Blocks buffered between the audio thread and the session.
const CAPTURE_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Device
// =============================================================================

/// Default input and output devices of the system audio host.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalAudioDevice;

impl CpalAudioDevice {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioDevice for CpalAudioDevice {
    async fn open_capture(&self, config: &CaptureConfig) -> AudioDeviceResult<Box<dyn CaptureStream>> {
        let config = *config;
        let (blocks_tx, blocks_rx) = mpsc::channel(CAPTURE_CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = oneshot::channel::<AudioDeviceResult<()>>();

        thread::Builder::new()
            .name("studenflow-capture".to_string())
            .spawn(move || run_capture_thread(config, blocks_tx, stop_rx, ready_tx))
            .map_err(|e| AudioDeviceError::StreamFailed(e.to_string()))?;

        ready_rx
            .await
            .map_err(|_| AudioDeviceError::StreamFailed("capture thread exited".to_string()))??;

        Ok(Box::new(CpalCapture {
            blocks: Some(blocks_rx),
            stop_tx: Some(stop_tx),
        }))
    }

    async fn open_playback(
        &self,
        sample_rate: u32,
        channels: u16,
    ) -> AudioDeviceResult<Arc<dyn PlaybackSink>> {
        let mixer = Arc::new(Mutex::new(Mixer::default()));
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = oneshot::channel::<AudioDeviceResult<()>>();

        let thread_mixer = Arc::clone(&mixer);
        thread::Builder::new()
            .name("studenflow-playback".to_string())
            .spawn(move || run_playback_thread(sample_rate, channels, thread_mixer, stop_rx, ready_tx))
            .map_err(|e| AudioDeviceError::StreamFailed(e.to_string()))?;

        ready_rx
            .await
            .map_err(|_| AudioDeviceError::StreamFailed("playback thread exited".to_string()))??;

        Ok(Arc::new(CpalPlayback {
            sample_rate,
            mixer,
            stop_tx: Mutex::new(Some(stop_tx)),
            closed: AtomicBool::new(false),
        }))
    }
}

fn input_device() -> AudioDeviceResult<cpal::Device> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| AudioDeviceError::NoDevice("no default input device".into()))?;

    let device_name = device
        .description()
        .map(|d| d.name().to_owned())
        .unwrap_or_else(|_| "<unknown>".into());
    info!("using input device: {device_name}");
    Ok(device)
}

fn output_device() -> AudioDeviceResult<cpal::Device> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioDeviceError::NoDevice("no default output device".into()))?;

    let device_name = device
        .description()
        .map(|d| d.name().to_owned())
        .unwrap_or_else(|_| "<unknown>".into());
    info!("using output device: {device_name}");
    Ok(device)
}

fn map_build_error(err: cpal::BuildStreamError) -> AudioDeviceError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => {
            AudioDeviceError::PermissionDenied("device not available".to_string())
        }
        other => AudioDeviceError::StreamFailed(other.to_string()),
    }
}

// =============================================================================
// Capture
// =============================================================================

struct CpalCapture {
    blocks: Option<mpsc::Receiver<AudioFrame>>,
    stop_tx: Option<std_mpsc::Sender<()>>,
}

impl CaptureStream for CpalCapture {
    fn take_blocks(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
        self.blocks.take()
    }

    fn stop(&mut self) {
        // Closing the channel wakes the capture thread, which drops the stream.
        if self.stop_tx.take().is_some() {
            debug!("capture stream stopping");
        }
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Re-frames resampled audio into fixed-size blocks.
struct BlockFramer {
    pending: Vec<f32>,
    block_size: usize,
    sample_rate: u32,
}

impl BlockFramer {
    fn push(&mut self, samples: &[f32], tx: &mpsc::Sender<AudioFrame>) {
        self.pending.extend_from_slice(samples);
        while self.pending.len() >= self.block_size {
            let rest = self.pending.split_off(self.block_size);
            let block = std::mem::replace(&mut self.pending, rest);
            if tx.try_send(AudioFrame::mono(block, self.sample_rate)).is_err() {
                debug!("capture channel full, dropping block");
            }
        }
    }
}

fn run_capture_thread(
    config: CaptureConfig,
    blocks_tx: mpsc::Sender<AudioFrame>,
    stop_rx: std_mpsc::Receiver<()>,
    ready_tx: oneshot::Sender<AudioDeviceResult<()>>,
) {
    let stream = match build_capture_stream(config, blocks_tx) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    // Returns once the sender is dropped.
    let _ = stop_rx.recv();
    drop(stream);
    info!("audio capture stopped");
}

fn build_capture_stream(
    config: CaptureConfig,
    blocks_tx: mpsc::Sender<AudioFrame>,
) -> AudioDeviceResult<cpal::Stream> {
    let device = input_device()?;
    let default_config = device
        .default_input_config()
        .map_err(|e| AudioDeviceError::StreamFailed(format!("no default input config: {e}")))?;

    let native_rate = default_config.sample_rate();
    let native_channels = default_config.channels();
    let stream_config = StreamConfig {
        channels: native_channels,
        sample_rate: native_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    let target_rate = config.sample_rate;
    let mut framer = BlockFramer {
        pending: Vec::with_capacity(config.block_size * 2),
        block_size: config.block_size.max(1),
        sample_rate: target_rate,
    };

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let mono = if native_channels > 1 {
                    AudioFrame::new(data.to_vec(), native_rate, native_channels)
                        .to_mono()
                        .samples
                } else {
                    data.to_vec()
                };
                let samples = resample_linear(&mono, native_rate, target_rate);
                framer.push(&samples, &blocks_tx);
            },
            move |err| {
                error!("audio input stream error: {err}");
            },
            None,
        )
        .map_err(map_build_error)?;

    stream
        .play()
        .map_err(|e| AudioDeviceError::StreamFailed(format!("failed to start input stream: {e}")))?;

    info!(
        "audio capture started: native {}Hz -> target {}Hz, {} samples per block",
        native_rate, target_rate, config.block_size
    );
    Ok(stream)
}

/// Linear-interpolation resampler.
pub(crate) fn resample_linear(samples: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate || samples.is_empty() || dst_rate == 0 {
        return samples.to_vec();
    }

    let ratio = src_rate as f64 / dst_rate as f64;
    let out_len = (samples.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = src_pos - idx as f64;

        let sample = if idx + 1 < samples.len() {
            samples[idx] as f64 * (1.0 - frac) + samples[idx + 1] as f64 * frac
        } else {
            samples[idx.min(samples.len() - 1)] as f64
        };
        output.push(sample as f32);
    }

    output
}

// =============================================================================
// Playback
// =============================================================================

struct ScheduledClip {
    start_frame: u64,
    samples: Vec<f32>,
}

impl ScheduledClip {
    fn end_frame(&self) -> u64 {
        self.start_frame + self.samples.len() as u64
    }
}

/// Output clock and queued clips, shared with the audio callback.
#[derive(Default)]
struct Mixer {
    frames_played: u64,
    clips: Vec<ScheduledClip>,
}

impl Mixer {
    fn render(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels.max(1)) {
            let position = self.frames_played;
            let mut value = 0.0f32;
            for clip in &self.clips {
                if position >= clip.start_frame && position < clip.end_frame() {
                    value += clip.samples[(position - clip.start_frame) as usize];
                }
            }
            frame.fill(value.clamp(-1.0, 1.0));
            self.frames_played += 1;
        }
        let now = self.frames_played;
        self.clips.retain(|clip| clip.end_frame() > now);
    }
}

struct CpalPlayback {
    sample_rate: u32,
    mixer: Arc<Mutex<Mixer>>,
    stop_tx: Mutex<Option<std_mpsc::Sender<()>>>,
    closed: AtomicBool,
}

impl PlaybackSink for CpalPlayback {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.mixer.lock().frames_played as f64 / self.sample_rate as f64
    }

    fn schedule(&self, frame: AudioFrame, start_at: f64) -> AudioDeviceResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AudioDeviceError::Closed);
        }
        if frame.sample_rate != self.sample_rate {
            return Err(AudioDeviceError::UnsupportedFormat(format!(
                "frame is {}Hz, output is {}Hz",
                frame.sample_rate, self.sample_rate
            )));
        }

        let mono = frame.to_mono();
        let start_frame = (start_at.max(0.0) * self.sample_rate as f64).round() as u64;
        self.mixer.lock().clips.push(ScheduledClip {
            start_frame,
            samples: mono.samples,
        });
        Ok(())
    }

    fn stop_all(&self) {
        self.mixer.lock().clips.clear();
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.stop_all();
            self.stop_tx.lock().take();
            debug!("output context closed");
        }
    }
}

impl Drop for CpalPlayback {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_playback_thread(
    sample_rate: u32,
    channels: u16,
    mixer: Arc<Mutex<Mixer>>,
    stop_rx: std_mpsc::Receiver<()>,
    ready_tx: oneshot::Sender<AudioDeviceResult<()>>,
) {
    let stream = match build_playback_stream(sample_rate, channels, mixer) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    let _ = stop_rx.recv();
    drop(stream);
    info!("audio playback stopped");
}

fn build_playback_stream(
    sample_rate: u32,
    channels: u16,
    mixer: Arc<Mutex<Mixer>>,
) -> AudioDeviceResult<cpal::Stream> {
    let device = output_device()?;
    let stream_config = StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };
    let out_channels = channels as usize;

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                mixer.lock().render(data, out_channels);
            },
            move |err| {
                error!("audio output stream error: {err}");
            },
            None,
        )
        .map_err(map_build_error)?;

    stream
        .play()
        .map_err(|e| AudioDeviceError::StreamFailed(format!("failed to start output stream: {e}")))?;

    info!("audio playback started at {}Hz", sample_rate);
    Ok(stream)
}

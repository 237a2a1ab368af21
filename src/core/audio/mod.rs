//! Audio primitives: PCM16 codec, playback scheduling, device seam and WAV export.
//!
//! # Formats
//!
//! - Microphone capture: 16kHz mono, 4096-sample blocks
//! - Realtime and synthesized speech output: 24kHz mono
//! - Wire format in both directions: PCM 16-bit signed little-endian, base64

pub mod codec;
#[cfg(feature = "device-audio")]
pub mod cpal_device;
pub mod device;
pub mod schedule;
pub mod wav;

pub use codec::{
    AudioFrame, CodecError, decode_inbound, encode_outbound, pcm16_mime_type, rms,
    sample_to_pcm16,
};
#[cfg(feature = "device-audio")]
pub use cpal_device::CpalAudioDevice;
pub use device::{
    AudioDevice, AudioDeviceError, AudioDeviceResult, CaptureConfig, CaptureStream, PlaybackSink,
};
pub use schedule::PlaybackSchedule;
pub use wav::write_wav;

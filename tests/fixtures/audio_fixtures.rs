//! Audio Test Fixtures
//!
//! Generated audio keeps inputs reproducible with no external files.
//!
//! Formats:
//! - Capture: 16kHz mono float samples in 4096-sample blocks
//! - Model output: 24kHz mono PCM16, base64 encoded

use std::f32::consts::PI;

use base64::prelude::*;

/// Capture sample rate
pub const CAPTURE_RATE: u32 = 16000;

/// Model output sample rate
pub const OUTPUT_RATE: u32 = 24000;

/// Samples per capture block
pub const BLOCK_SIZE: usize = 4096;

/// Generate silence
pub fn generate_silence(duration_samples: usize) -> Vec<f32> {
    vec![0.0; duration_samples]
}

/// Generate a sine wave tone at `sample_rate`
pub fn generate_sine_wave(
    duration_samples: usize,
    frequency: f32,
    amplitude: f32,
    sample_rate: u32,
) -> Vec<f32> {
    let angular_freq = 2.0 * PI * frequency / sample_rate as f32;
    (0..duration_samples)
        .map(|i| (angular_freq * i as f32).sin() * amplitude)
        .collect()
}

/// One capture block holding a 440 Hz tone
pub fn capture_block(amplitude: f32) -> Vec<f32> {
    generate_sine_wave(BLOCK_SIZE, 440.0, amplitude, CAPTURE_RATE)
}

/// Base64 of `samples` little-endian PCM16 values
pub fn pcm16_base64(samples: &[i16]) -> String {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    BASE64_STANDARD.encode(bytes)
}

/// Base64 PCM16 chunk of `duration_secs` at 24kHz
pub fn output_chunk(duration_secs: f64) -> String {
    let samples = (duration_secs * OUTPUT_RATE as f64).round() as usize;
    let tone: Vec<i16> = generate_sine_wave(samples, 220.0, 0.25, OUTPUT_RATE)
        .into_iter()
        .map(|s| (s * 32767.0) as i16)
        .collect();
    pcm16_base64(&tone)
}

/// Decode little-endian PCM16 base64 back to values
pub fn decode_pcm16_base64(data: &str) -> Vec<i16> {
    let bytes = BASE64_STANDARD.decode(data).expect("valid base64");
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

//! WAV export for decoded audio.

use std::path::Path;

use super::codec::{AudioFrame, sample_to_pcm16};

/// Write `frame` as a 16-bit PCM WAV file.
///
/// Samples are clamped to the PCM16 range here; a file on disk should not
/// carry the wrap-around of the wire encoding.
pub fn write_wav(path: impl AsRef<Path>, frame: &AudioFrame) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: frame.channels,
        sample_rate: frame.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &frame.samples {
        writer.write_sample(sample_to_pcm16(sample.clamp(-1.0, 32767.0 / 32768.0)))?;
    }
    writer.finalize()
}

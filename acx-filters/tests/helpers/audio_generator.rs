//! WAV test file generation
//!
//! Writes small files with known sample values straight through hound, so
//! reading them back exercises `acx_filters::wav` independently of its writer.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f64::consts::PI;
use std::path::Path;

/// Standard test sample rate (44.1 kHz)
pub const TEST_SAMPLE_RATE: u32 = 44100;

/// Write 16-bit PCM with one vector per channel
///
/// All channels must have the same length.
pub fn write_pcm16_wav<P: AsRef<Path>>(path: P, channels: &[Vec<i16>]) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;

    let len = channels.first().map(Vec::len).unwrap_or(0);
    for i in 0..len {
        for channel in channels {
            writer.write_sample(channel[i])?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Generate a mono 32-bit float sine wave
///
/// # Arguments
/// * `path` - Output file path
/// * `frequency` - Tone frequency in Hz
/// * `num_samples` - Length in samples
/// * `amplitude` - Peak amplitude (0.0 to 1.0)
pub fn generate_sine_f32_wav<P: AsRef<Path>>(
    path: P,
    frequency: f64,
    num_samples: usize,
    amplitude: f32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;

    for i in 0..num_samples {
        let t = i as f64 / TEST_SAMPLE_RATE as f64;
        let sample = amplitude * (2.0 * PI * frequency * t).sin() as f32;
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}

/// Read every interleaved sample of a 16-bit file
pub fn read_pcm16_samples<P: AsRef<Path>>(path: P) -> Result<Vec<i16>, hound::Error> {
    let mut reader = hound::WavReader::open(path)?;
    reader.samples::<i16>().collect()
}

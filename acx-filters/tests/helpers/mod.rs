//! Shared test infrastructure for acx-filters integration tests
//!
//! - audio_generator: WAV files with known content, written through hound
//! - stream builders and comparison helpers for in-memory clips

#![allow(dead_code)]

pub mod audio_generator;

pub use audio_generator::{generate_sine_f32_wav, read_pcm16_samples, write_pcm16_wav, TEST_SAMPLE_RATE};

use acx_common::SampleType;
use acx_filters::{AudioFormat, AudioInfo, MemoryClip, NodeRef, Plane};

/// Float64 clip holding `channels` verbatim
pub fn f64_clip(frame_samples: usize, channels: &[Vec<f64>]) -> NodeRef {
    let len = channels.first().map(Vec::len).unwrap_or(0) as i64;
    let info = AudioInfo::new(
        AudioFormat::new(SampleType::Float64, channels.len()),
        TEST_SAMPLE_RATE,
        len,
        frame_samples,
    )
    .unwrap();
    let planes = channels.iter().map(|c| Plane::F64(c.clone())).collect();
    MemoryClip::from_planes(info, planes).unwrap().into_node()
}

/// Clip of any sample type from normalized values
pub fn clip(sample_type: SampleType, frame_samples: usize, channels: &[Vec<f64>]) -> NodeRef {
    let len = channels.first().map(Vec::len).unwrap_or(0) as i64;
    let info = AudioInfo::new(
        AudioFormat::new(sample_type, channels.len()),
        TEST_SAMPLE_RATE,
        len,
        frame_samples,
    )
    .unwrap();
    MemoryClip::from_normalized(info, channels).unwrap().into_node()
}

/// Distinct, exactly representable sample values `1/1024, 2/1024, ...`
pub fn ramp(len: usize) -> Vec<f64> {
    (1..=len).map(|i| i as f64 / 1024.0).collect()
}

pub fn render(node: &NodeRef) -> MemoryClip {
    MemoryClip::render(node.as_ref()).unwrap()
}

pub fn assert_close(actual: &[f64], expected: &[f64], eps: f64) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() <= eps, "sample {}: got {}, expected {}", i, a, e);
    }
}

//! Peak scanner
//!
//! Finds the sample of largest magnitude over a set of channels. The scan
//! over a stream is a blocking loop that stops early once an integer
//! stream reaches saturation, since no later frame can exceed it.

use crate::frame::{AudioFrame, Plane};
use crate::host::AudioNode;
use acx_common::codec::{self, cast_f32_toward_zero};
use acx_common::{Result, SampleType};
use tracing::debug;

/// Peak of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakResult {
    /// Normalized magnitude when normalizing, otherwise the signed peak sample
    /// (integer types: the unshifted integer value)
    pub value: f64,
    /// The largest possible peak was found; remaining frames can be skipped
    pub is_max: bool,
}

/// Peak of `channels` in one frame
pub fn find_frame_peak(frame: &AudioFrame, channels: &[usize], normalize: bool) -> PeakResult {
    let sample_type = frame.sample_type();
    if sample_type.is_float() {
        float_frame_peak(frame, channels, normalize)
    } else {
        int_frame_peak(frame, channels, sample_type, normalize)
    }
}

fn int_frame_peak(frame: &AudioFrame, channels: &[usize], sample_type: SampleType, normalize: bool) -> PeakResult {
    let shift = sample_type.storage_shift();
    let max_int = sample_type.max_int();
    let min_int = sample_type.min_int();

    let mut pos_peak: i64 = 0;
    let mut neg_peak: i64 = 0;
    let mut found_max = false;

    'channels: for &ch in channels {
        for i in 0..frame.len() {
            let sample = match frame.plane(ch) {
                Plane::I8(v) => v[i] as i64,
                Plane::I16(v) => v[i] as i64,
                Plane::I32(v) => v[i] as i64,
                _ => 0,
            } >> shift;

            if sample < neg_peak {
                neg_peak = sample;

                if neg_peak <= -max_int && (neg_peak == min_int || normalize) {
                    found_max = true;
                    break 'channels;
                }
            } else if pos_peak < sample {
                pos_peak = sample;

                if pos_peak == max_int && normalize {
                    found_max = true;
                    break 'channels;
                }
            }
        }
    }

    if normalize {
        let pos = codec::int_to_normalized(pos_peak << shift, sample_type);
        let neg = codec::int_to_normalized(neg_peak << shift, sample_type);
        return PeakResult {
            value: pos.max(neg.abs()),
            is_max: found_max,
        };
    }

    let pos = pos_peak as f64;
    let neg = neg_peak as f64;
    PeakResult {
        value: if pos < neg.abs() { neg } else { pos },
        is_max: found_max,
    }
}

fn float_frame_peak(frame: &AudioFrame, channels: &[usize], normalize: bool) -> PeakResult {
    let mut peak: f64 = 0.0;

    for &ch in channels {
        for i in 0..frame.len() {
            let sample = frame.normalized(ch, i);
            if peak.abs() < sample.abs() {
                peak = sample;
            }
        }
    }

    PeakResult {
        value: if normalize { peak.abs() } else { peak },
        is_max: false,
    }
}

/// Peak of `channels` over the whole stream
///
/// Blocks until every frame has been read or the absolute maximum was found.
pub fn find_peak(node: &dyn AudioNode, channels: &[usize], normalize: bool) -> Result<f64> {
    let num_frames = node.info().num_frames();

    let mut peak: f64 = 0.0;
    let mut is_max = false;
    let mut n = 0;

    while n < num_frames && !is_max {
        let frame = node.get_frame(n)?;
        let result = find_frame_peak(&frame, channels, normalize);

        is_max |= result.is_max;
        if peak.abs() < result.value.abs() {
            peak = result.value;
        }
        n += 1;
    }

    if is_max && n < num_frames {
        debug!("Peak scan stopped at frame {} of {}: maximum reached", n, num_frames);
    }

    Ok(peak)
}

/// Largest value not above `norm_peak` that is exactly representable in `sample_type`
///
/// Used for normalization targets so the gain itself can never overflow.
pub fn adjust_norm_peak(norm_peak: f64, sample_type: SampleType) -> f64 {
    let abs_peak = norm_peak.abs();

    let adjusted = match sample_type {
        SampleType::Float32 => cast_f32_toward_zero(abs_peak) as f64,
        SampleType::Float64 => abs_peak,
        _ => {
            let max_int = sample_type.max_int() as f64;
            (abs_peak * max_int).floor() / max_int
        }
    };

    adjusted.copysign(norm_peak)
}

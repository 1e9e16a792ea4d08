//! Normalized sample codec
//!
//! Converts between native sample values and the canonical normalized `f64`
//! interchange form in `[-1, 1]`.
//!
//! # Conventions
//!
//! - Integer samples are carried as `i64` in their *stored* form, i.e. Int24
//!   values are already shifted left by 8. Decoding shifts right first.
//! - The integer range is symmetric: `min_int` decodes like `-max_int`.
//! - Encoding to an integer clamps to `[-1, 1]` and rounds half away from zero.
//! - Encoding to Float32 without clamping rounds toward zero, so re-widening
//!   never produces a magnitude larger than the input.

use crate::sample_type::SampleType;

/// A single sample in its native representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeSample {
    /// Integer sample in stored (shifted) form
    Int(i64),
    F32(f32),
    F64(f64),
}

impl NativeSample {
    /// Stored integer value; floats are rounded and saturated
    pub fn as_i64(self) -> i64 {
        match self {
            NativeSample::Int(x) => x,
            NativeSample::F32(x) => x.round() as i64,
            NativeSample::F64(x) => x.round() as i64,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            NativeSample::Int(x) => x as f64,
            NativeSample::F32(x) => x as f64,
            NativeSample::F64(x) => x,
        }
    }
}

/// True if a normalized sample lies outside `[-1, 1]`
pub fn is_overflowing(sample: f64) -> bool {
    sample < -1.0 || 1.0 < sample
}

/// Decode a stored integer sample to a normalized value
pub fn int_to_normalized(stored: i64, sample_type: SampleType) -> f64 {
    let max_int = sample_type.max_int();
    let mut value = stored >> sample_type.storage_shift();
    if value == sample_type.min_int() {
        value = -max_int;
    }
    value as f64 / max_int as f64
}

/// Encode a normalized value as a stored integer sample
pub fn normalized_to_int(sample: f64, sample_type: SampleType) -> i64 {
    let clamped = sample.clamp(-1.0, 1.0);
    // f64::round rounds half away from zero
    let value = (clamped * sample_type.max_int() as f64).round() as i64;
    value << sample_type.storage_shift()
}

/// Narrow to `f32` choosing the neighbour of same or lower magnitude
pub fn cast_f32_toward_zero(sample: f64) -> f32 {
    let narrowed = sample as f32;
    let widened = narrowed as f64;

    if (0.0 < sample && sample < widened) || (sample < 0.0 && widened < sample) {
        // magnitude grew: step one ulp toward zero (also maps +-inf to +-MAX)
        f32::from_bits(narrowed.to_bits() - 1)
    } else {
        narrowed
    }
}

/// Decode any native sample to a normalized value
///
/// Float samples are widened exactly and may lie outside `[-1, 1]`.
pub fn to_normalized(sample: NativeSample, sample_type: SampleType) -> f64 {
    match sample {
        NativeSample::Int(stored) => int_to_normalized(stored, sample_type),
        NativeSample::F32(v) => v as f64,
        NativeSample::F64(v) => v,
    }
}

/// Encode a normalized value in the native representation of `sample_type`
///
/// `clamp_float` only affects float types; integers are always clamped.
pub fn from_normalized(sample: f64, sample_type: SampleType, clamp_float: bool) -> NativeSample {
    match sample_type {
        SampleType::Float32 => {
            if clamp_float {
                NativeSample::F32((sample as f32).clamp(-1.0, 1.0))
            } else {
                NativeSample::F32(cast_f32_toward_zero(sample))
            }
        }
        SampleType::Float64 => {
            if clamp_float {
                NativeSample::F64(sample.clamp(-1.0, 1.0))
            } else {
                NativeSample::F64(sample)
            }
        }
        _ => NativeSample::Int(normalized_to_int(sample, sample_type)),
    }
}

/// Interpret a literal value in the units of `sample_type`
///
/// Integers are rounded and clamped to `[-max_int, max_int]` (so `32767.0`
/// is full scale for Int16); floats are cast as-is.
pub fn cast_sample(value: f64, sample_type: SampleType) -> NativeSample {
    match sample_type {
        SampleType::Float32 => NativeSample::F32(value as f32),
        SampleType::Float64 => NativeSample::F64(value),
        _ => {
            let max_int = sample_type.max_int() as f64;
            let logical = value.round().clamp(-max_int, max_int) as i64;
            NativeSample::Int(logical << sample_type.storage_shift())
        }
    }
}

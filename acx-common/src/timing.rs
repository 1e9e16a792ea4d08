//! Sample/seconds conversions
//!
//! Lengths and positions are configured either as sample counts or as
//! seconds. Seconds are converted with `round(seconds * sample_rate)`.

/// Convert seconds to a sample count, rounding to the nearest sample
pub fn seconds_to_samples(seconds: f64, sample_rate: u32) -> i64 {
    (seconds * sample_rate as f64).round() as i64
}

pub fn samples_to_seconds(samples: i64, sample_rate: u32) -> f64 {
    samples as f64 / sample_rate as f64
}

/// Resolve an optional `samples` / `seconds` pair; samples take priority
pub fn samples_or_seconds(samples: Option<i64>, seconds: Option<f64>, sample_rate: u32, default: i64) -> i64 {
    match (samples, seconds) {
        (Some(s), _) => s,
        (None, Some(sec)) => seconds_to_samples(sec, sample_rate),
        (None, None) => default,
    }
}

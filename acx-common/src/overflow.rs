//! Overflow policy engine
//!
//! Wraps the normalized → native direction of the codec with overflow
//! detection, clipping, statistics and throttled reporting.
//!
//! # Modes
//!
//! | mode         | integer output      | float output          |
//! |--------------|---------------------|-----------------------|
//! | `error`      | frame fails         | frame fails           |
//! | `clip`       | clamp               | clamp                 |
//! | `clip_int`   | clamp               | keep overflowing value|
//! | `keep_float` | frame fails         | keep overflowing value|
//!
//! # Reporting
//!
//! - `all`: a warning for every overflowing sample
//! - `once`: only the first overflowing sample of a render pass
//! - `none`: silent
//!
//! Statistics are owned by one compositor instance and are only meaningful
//! when that instance renders its frames sequentially starting at frame 0.

use crate::codec::{self, NativeSample};
use crate::sample_type::SampleType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// What to do with an overflowing sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowMode {
    /// Abort the current output frame with an error
    #[default]
    Error,
    /// Clip all sample types
    Clip,
    /// Clip integer sample types only, let float samples overflow
    ClipInt,
    /// Let float samples overflow; an integer output type is an error
    KeepFloat,
}

impl OverflowMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" => Some(OverflowMode::Error),
            "clip" => Some(OverflowMode::Clip),
            "clip_int" => Some(OverflowMode::ClipInt),
            "keep_float" => Some(OverflowMode::KeepFloat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowMode::Error => "error",
            OverflowMode::Clip => "clip",
            OverflowMode::ClipInt => "clip_int",
            OverflowMode::KeepFloat => "keep_float",
        }
    }

    pub fn all_variants() -> &'static [OverflowMode] {
        &[
            OverflowMode::Error,
            OverflowMode::Clip,
            OverflowMode::ClipInt,
            OverflowMode::KeepFloat,
        ]
    }
}

impl fmt::Display for OverflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How verbosely overflowing samples are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowLog {
    All,
    #[default]
    Once,
    None,
}

impl OverflowLog {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(OverflowLog::All),
            "once" => Some(OverflowLog::Once),
            "none" => Some(OverflowLog::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowLog::All => "all",
            OverflowLog::Once => "once",
            OverflowLog::None => "none",
        }
    }

    pub fn all_variants() -> &'static [OverflowLog] {
        &[OverflowLog::All, OverflowLog::Once, OverflowLog::None]
    }
}

impl fmt::Display for OverflowLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Running overflow statistics of one render pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverflowStats {
    pub count: i64,
    /// Largest absolute overflowing sample
    pub peak: f64,
}

impl OverflowStats {
    pub fn reset(&mut self) {
        *self = OverflowStats::default();
    }

    pub fn add_sample(&mut self, sample: f64) {
        self.count += 1;

        let abs_sample = sample.abs();
        if self.peak < abs_sample {
            self.peak = abs_sample;
        }
    }

    /// End-of-pass summary line, if anything overflowed and the mode recovers
    pub fn summary_message(&self, func_name: &str, mode: OverflowMode, float_output: bool) -> Option<String> {
        if self.count == 0 {
            return None;
        }

        match mode {
            OverflowMode::ClipInt | OverflowMode::KeepFloat if float_output => Some(format!(
                "{}: {} sample overflows detected. Peak: {:.6}",
                func_name, self.count, self.peak
            )),
            OverflowMode::ClipInt | OverflowMode::KeepFloat | OverflowMode::Clip => Some(format!(
                "{}: {} sample overflows detected. Peak: {:.6}. All overflows clipped.",
                func_name, self.count, self.peak
            )),
            OverflowMode::Error => None,
        }
    }

    /// Log the end-of-pass summary
    ///
    /// Unclipped float overflows are a warning, clipped ones informational.
    pub fn log_summary(&self, func_name: &str, mode: OverflowMode, float_output: bool) {
        if let Some(msg) = self.summary_message(func_name, mode, float_output) {
            let clipped = !(float_output && matches!(mode, OverflowMode::ClipInt | OverflowMode::KeepFloat));
            if clipped {
                info!("{}", msg);
            } else {
                warn!("{}", msg);
            }
        }
    }
}

pub fn overflow_message(func_name: &str, sample: f64, position: i64, channel: usize) -> String {
    format!(
        "{}: Overflow detected. position: {}, channel: {}, sample: {:.6}",
        func_name, position, channel, sample
    )
}

/// Overflow configuration of one compositor instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowPolicy {
    pub mode: OverflowMode,
    pub log: OverflowLog,
    /// Compositor name prefixed to every message
    pub func_name: &'static str,
}

impl OverflowPolicy {
    pub fn new(func_name: &'static str, mode: OverflowMode, log: OverflowLog) -> Self {
        Self { mode, log, func_name }
    }

    /// Reject `keep_float` for an integer output type before any frame is rendered
    pub fn validate(&self, output_type: SampleType) -> Result<()> {
        if self.mode == OverflowMode::KeepFloat && !output_type.is_float() {
            return Err(Error::InvalidInput(format!(
                "{}: cannot use 'keep_float' overflow mode with an integer sample type",
                self.func_name
            )));
        }
        Ok(())
    }

    fn handling_message(&self, output_type: SampleType) -> String {
        match self.mode {
            OverflowMode::Error => format!("{}: Exiting with an error.", self.func_name),
            OverflowMode::ClipInt | OverflowMode::KeepFloat if output_type.is_float() => {
                format!("{}: Overflowing samples will *not* be clipped.", self.func_name)
            }
            _ => format!("{}: Overflowing samples will be clipped.", self.func_name),
        }
    }

    fn log_overflow(&self, sample: f64, position: i64, channel: usize, output_type: SampleType, stats: &OverflowStats) {
        match self.log {
            OverflowLog::All => {
                warn!("{}", overflow_message(self.func_name, sample, position, channel));

                if stats.count == 0 {
                    info!("{}", self.handling_message(output_type));
                }
            }
            OverflowLog::Once => {
                if stats.count == 0 {
                    let msg = overflow_message(self.func_name, sample, position, channel);
                    if self.mode == OverflowMode::Error {
                        error!("{}", msg);
                    } else {
                        warn!("{}", msg);
                    }

                    info!("{}", self.handling_message(output_type));

                    if self.mode != OverflowMode::Error {
                        info!("{}: Only the first overflow will be logged.", self.func_name);
                    }
                }
            }
            OverflowLog::None => {}
        }
    }

    /// Convert a normalized sample to `output_type`, applying the overflow policy
    ///
    /// `position` and `channel` only feed the messages. Returns an
    /// [`Error::Overflow`] when the current frame must be aborted.
    pub fn safe_convert(
        &self,
        sample: f64,
        position: i64,
        channel: usize,
        output_type: SampleType,
        stats: &mut OverflowStats,
    ) -> Result<NativeSample> {
        if !codec::is_overflowing(sample) {
            return Ok(codec::from_normalized(sample, output_type, false));
        }

        self.log_overflow(sample, position, channel, output_type, stats);
        stats.add_sample(sample);

        match self.mode {
            OverflowMode::Error => Err(Error::Overflow(overflow_message(
                self.func_name,
                sample,
                position,
                channel,
            ))),
            OverflowMode::KeepFloat if !output_type.is_float() => Err(Error::Overflow(format!(
                "{}: Overflow detected. keep_float cannot be used with integer sample types",
                self.func_name
            ))),
            OverflowMode::KeepFloat | OverflowMode::ClipInt if output_type.is_float() => {
                Ok(codec::from_normalized(sample, output_type, false))
            }
            _ => Ok(codec::from_normalized(sample, output_type, true)),
        }
    }
}

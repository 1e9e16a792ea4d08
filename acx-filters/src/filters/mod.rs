//! Stream compositors
//!
//! Each compositor validates its parameters at construction, derives its
//! output layout and sample-position breakpoints, then renders one output
//! frame per ready-phase call. Every computed sample goes through the
//! overflow policy before it is stored.
//!
//! The `create_*`-style constructors (`delay`, `fade_in`, ...) wrap the
//! compositor in a [`FilterNode`](crate::host::FilterNode) and return a
//! shareable stream handle.

pub mod convert;
pub mod crossfade;
pub mod delay;
pub mod fade;
pub mod find_peak;
pub mod mix;
pub mod normalize;
pub mod set_samples;
pub mod sine_tone;

pub use convert::{convert, Convert, ConvertParams};
pub use crossfade::{cross_fade, CrossFade, CrossFadeParams};
pub use delay::{delay, Delay, DelayParams};
pub use fade::{fade_in, fade_out, Fade, FadeInParams, FadeOutParams};
pub use find_peak::{find_peak, FindPeakParams};
pub use mix::{mix, Mix, MixParams};
pub use normalize::{normalize, Normalize, NormalizeParams};
pub use set_samples::{set_samples, SetSamples, SetSamplesParams};
pub use sine_tone::{sine_tone, SineTone, SineToneParams};

use crate::frame::AudioFrame;
use acx_common::{
    Error, OverflowLog, OverflowMode, OverflowPolicy, OverflowStats, Result, SampleType,
};

/// Overflow settings shared by every compositor's parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverflowParams {
    pub mode: OverflowMode,
    pub log: OverflowLog,
}

/// Writes normalized samples into an output frame through the overflow policy
#[derive(Debug, Clone)]
pub(crate) struct SampleWriter {
    policy: OverflowPolicy,
    stats: OverflowStats,
    sample_type: SampleType,
}

impl SampleWriter {
    /// Fails for `keep_float` with an integer `sample_type`
    pub(crate) fn new(func_name: &'static str, params: OverflowParams, sample_type: SampleType) -> Result<Self> {
        let policy = OverflowPolicy::new(func_name, params.mode, params.log);
        policy.validate(sample_type)?;
        Ok(Self {
            policy,
            stats: OverflowStats::default(),
            sample_type,
        })
    }

    /// Store `sample` at `idx` of `channel`; `position` is the output stream position
    pub(crate) fn write(
        &mut self,
        frame: &mut AudioFrame,
        channel: usize,
        idx: usize,
        position: i64,
        sample: f64,
    ) -> Result<()> {
        let native = self
            .policy
            .safe_convert(sample, position, channel, self.sample_type, &mut self.stats)?;
        frame.set_native(channel, idx, native);
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.stats.reset();
    }

    pub(crate) fn log_summary(&self) {
        self.stats
            .log_summary(self.policy.func_name, self.policy.mode, self.sample_type.is_float());
    }

    #[cfg(test)]
    pub(crate) fn stats(&self) -> OverflowStats {
        self.stats
    }
}

/// Reject a negative length or position parameter
pub(crate) fn check_non_negative(func_name: &str, what: &str, value: i64) -> Result<()> {
    if value < 0 {
        return Err(Error::InvalidInput(format!("{}: negative {}", func_name, what)));
    }
    Ok(())
}

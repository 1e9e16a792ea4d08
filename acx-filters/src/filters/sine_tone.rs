//! SineTone: synthesized test source
//!
//! Every channel carries the same sine wave. Having no inputs, it is the
//! usual starting point for composing test material.

use super::{OverflowParams, SampleWriter};
use crate::frame::{AudioFormat, AudioFrame, AudioInfo};
use crate::host::{new_output_frame, Compositor, FilterNode, FrameRequest, InputFrames, NodeRef};
use crate::peak::adjust_norm_peak;
use acx_common::config::DEFAULT_FRAME_SAMPLES;
use acx_common::timing::{samples_or_seconds, samples_to_seconds};
use acx_common::{Error, Result, SampleType};
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::{debug, warn};

const FUNC_NAME: &str = "SineTone";

const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_SECONDS: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct SineToneParams {
    pub sample_rate: u32,
    /// Length; `samples` takes priority over `seconds`, default 10 s
    pub samples: Option<i64>,
    pub seconds: Option<f64>,
    pub sample_type: SampleType,
    /// Frequency in Hz
    pub freq: f64,
    /// Peak amplitude, normalized; a negative value inverts the phase
    pub amplitude: f64,
    pub num_channels: usize,
    pub frame_samples: usize,
    pub overflow: OverflowParams,
}

impl Default for SineToneParams {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            samples: None,
            seconds: None,
            sample_type: SampleType::Int16,
            freq: 500.0,
            amplitude: 1.0,
            num_channels: 2,
            frame_samples: DEFAULT_FRAME_SAMPLES,
            overflow: OverflowParams::default(),
        }
    }
}

pub struct SineTone {
    info: AudioInfo,
    freq: f64,
    amplitude: f64,
    abs_amplitude: f64,
    writer: SampleWriter,
}

impl SineTone {
    pub fn new(params: &SineToneParams) -> Result<Self> {
        if params.sample_rate == 0 {
            return Err(Error::InvalidInput(format!("{}: zero sample_rate", FUNC_NAME)));
        }

        let default_samples = (DEFAULT_SECONDS * params.sample_rate as f64) as i64;
        let num_samples = samples_or_seconds(params.samples, params.seconds, params.sample_rate, default_samples);
        if num_samples <= 0 {
            return Err(Error::InvalidInput(format!("{}: negative or zero length", FUNC_NAME)));
        }

        if params.freq <= 0.0 {
            return Err(Error::InvalidInput(format!("{}: negative or zero freq", FUNC_NAME)));
        }

        if !params.sample_type.is_container_type() {
            return Err(Error::InvalidInput(format!(
                "{}: unsupported sample type {}",
                FUNC_NAME, params.sample_type
            )));
        }

        if 1.0 < params.amplitude.abs() {
            warn!("{}: amp is greater than 1 -> possible sample overflow", FUNC_NAME);
        }

        let writer = SampleWriter::new(FUNC_NAME, params.overflow, params.sample_type)?;

        let info = AudioInfo::new(
            AudioFormat::new(params.sample_type, params.num_channels),
            params.sample_rate,
            num_samples,
            params.frame_samples,
        )?;

        let amplitude = adjust_norm_peak(params.amplitude, params.sample_type);

        debug!(
            "{}: {} Hz, amplitude {:.6}, {} samples at {} Hz",
            FUNC_NAME, params.freq, amplitude, num_samples, params.sample_rate
        );

        Ok(Self {
            info,
            freq: params.freq,
            amplitude,
            abs_amplitude: amplitude.abs(),
            writer,
        })
    }

    fn sample_at(&self, pos: i64) -> f64 {
        let t = samples_to_seconds(pos, self.info.sample_rate);
        // precision loss in sin() must not exceed the amplitude
        (self.amplitude * (2.0 * PI * t * self.freq).sin()).clamp(-self.abs_amplitude, self.abs_amplitude)
    }
}

impl Compositor for SineTone {
    fn name(&self) -> &'static str {
        FUNC_NAME
    }

    fn out_info(&self) -> &AudioInfo {
        &self.info
    }

    fn request_frames(&self, _n: i64) -> Vec<FrameRequest> {
        Vec::new()
    }

    fn produce_frame(&mut self, n: i64, _inputs: &InputFrames) -> Result<Arc<AudioFrame>> {
        let mut out = new_output_frame(&self.info, n);
        let out_pos_frame_start = self.info.grid().frame_to_first_sample(n);

        for s in 0..out.len() {
            let out_pos = out_pos_frame_start + s as i64;
            let sample = self.sample_at(out_pos);
            for ch in 0..self.info.num_channels() {
                self.writer.write(&mut out, ch, s, out_pos, sample)?;
            }
        }

        Ok(Arc::new(out))
    }

    fn reset_overflow_stats(&mut self) {
        self.writer.reset();
    }

    fn log_overflow_stats(&self) {
        self.writer.log_summary();
    }
}

/// Sine wave source
pub fn sine_tone(params: &SineToneParams) -> Result<NodeRef> {
    let compositor = SineTone::new(params)?;
    Ok(FilterNode::new(compositor, Vec::new()).into_node())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_util::{assert_close, render};
    use crate::peak::find_peak;

    #[test]
    fn test_defaults() {
        let node = sine_tone(&SineToneParams::default()).unwrap();
        let info = node.info();
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.num_samples, 441_000);
        assert_eq!(info.num_channels(), 2);
        assert_eq!(info.sample_type(), SampleType::Int16);
    }

    #[test]
    fn test_quarter_period_samples() {
        // 4 samples per period
        let params = SineToneParams {
            sample_rate: 8,
            samples: Some(8),
            freq: 2.0,
            amplitude: 0.5,
            sample_type: SampleType::Float32,
            num_channels: 1,
            frame_samples: 3,
            ..Default::default()
        };

        let out = render(&sine_tone(&params).unwrap());
        assert_close(
            &out.channel_normalized(0),
            &[0.0, 0.5, 0.0, -0.5, 0.0, 0.5, 0.0, -0.5],
            1e-6,
        );
    }

    #[test]
    fn test_full_scale_int_tone_never_overflows() {
        let params = SineToneParams {
            sample_rate: 48000,
            seconds: Some(0.1),
            freq: 1000.0,
            sample_type: SampleType::Int24,
            frame_samples: 512,
            ..Default::default()
        };
        let node = sine_tone(&params).unwrap();
        assert_eq!(node.info().num_samples, 4800);

        let peak = find_peak(node.as_ref(), &[0, 1], true).unwrap();
        assert!((peak - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_channels_are_identical() {
        let params = SineToneParams {
            samples: Some(100),
            num_channels: 3,
            frame_samples: 16,
            ..Default::default()
        };
        let out = render(&sine_tone(&params).unwrap());
        assert_eq!(out.channel_plane(0), out.channel_plane(2));
    }

    #[test]
    fn test_invalid_parameters() {
        let cases = [
            (
                SineToneParams {
                    freq: 0.0,
                    ..Default::default()
                },
                "SineTone: negative or zero freq",
            ),
            (
                SineToneParams {
                    samples: Some(0),
                    ..Default::default()
                },
                "SineTone: negative or zero length",
            ),
            (
                SineToneParams {
                    sample_rate: 0,
                    ..Default::default()
                },
                "SineTone: zero sample_rate",
            ),
            (
                SineToneParams {
                    sample_type: SampleType::Float64,
                    ..Default::default()
                },
                "SineTone: unsupported sample type f64",
            ),
            (
                SineToneParams {
                    sample_type: SampleType::Int8,
                    ..Default::default()
                },
                "SineTone: unsupported sample type i8",
            ),
        ];

        for (params, message) in cases {
            let err = sine_tone(&params).err().unwrap();
            assert_eq!(err.to_string(), format!("Invalid input: {}", message));
        }
    }
}

//! SetSamples: overwrite a sample range with a constant
//!
//! `sample` is given in the units of the stream's sample type, e.g. `32767`
//! is full scale for an `i16` stream and `1.0` for a float stream.

use super::{OverflowParams, SampleWriter};
use crate::channels::ChannelSet;
use crate::frame::{AudioFrame, AudioInfo};
use crate::host::{new_output_frame, Compositor, FilterNode, FrameRequest, InputFrames, NodeRef};
use acx_common::codec::{cast_sample, to_normalized};
use acx_common::Result;
use std::sync::Arc;
use tracing::debug;

const FUNC_NAME: &str = "SetSamples";

#[derive(Debug, Clone, Default)]
pub struct SetSamplesParams {
    pub sample: f64,
    /// First overwritten sample (inclusive), default 0
    pub start_sample: Option<i64>,
    /// End of the range (exclusive), default stream end
    pub end_sample: Option<i64>,
    pub channels: Vec<usize>,
    pub overflow: OverflowParams,
}

pub struct SetSamples {
    info: AudioInfo,
    /// Normalized value of `sample` after casting to the stream type
    value: f64,
    out_pos_start: i64,
    out_pos_end: i64,
    channels: ChannelSet,
    writer: SampleWriter,
}

impl SetSamples {
    pub fn new(in_info: &AudioInfo, params: &SetSamplesParams) -> Result<Self> {
        let channels = ChannelSet::new(FUNC_NAME, &params.channels, in_info.num_channels())?;
        let writer = SampleWriter::new(FUNC_NAME, params.overflow, in_info.sample_type())?;

        let sample_type = in_info.sample_type();
        let value = to_normalized(cast_sample(params.sample, sample_type), sample_type);

        let out_pos_start = params.start_sample.unwrap_or(0);
        let out_pos_end = params.end_sample.unwrap_or(in_info.num_samples);

        debug!(
            "{}: [{}, {}) = {} ({:.6} normalized)",
            FUNC_NAME, out_pos_start, out_pos_end, params.sample, value
        );

        Ok(Self {
            info: *in_info,
            value,
            out_pos_start,
            out_pos_end,
            channels,
            writer,
        })
    }

    fn write_channel(&mut self, out: &mut AudioFrame, ch: usize, n: i64, in_frame: &AudioFrame) -> Result<()> {
        let out_pos_frame_start = self.info.grid().frame_to_first_sample(n);

        for s in 0..out.len() {
            let out_pos = out_pos_frame_start + s as i64;
            let sample = if self.out_pos_start <= out_pos && out_pos < self.out_pos_end {
                self.value
            } else {
                in_frame.normalized(ch, s)
            };
            self.writer.write(out, ch, s, out_pos, sample)?;
        }
        Ok(())
    }
}

impl Compositor for SetSamples {
    fn name(&self) -> &'static str {
        FUNC_NAME
    }

    fn out_info(&self) -> &AudioInfo {
        &self.info
    }

    fn request_frames(&self, n: i64) -> Vec<FrameRequest> {
        vec![FrameRequest::new(0, n)]
    }

    fn produce_frame(&mut self, n: i64, inputs: &InputFrames) -> Result<Arc<AudioFrame>> {
        let in_frame = inputs.require(0, n)?;
        let mut out = new_output_frame(&self.info, n);

        for &ch in self.channels.copy() {
            out.copy_channel_from(ch, in_frame);
        }

        let edit = self.channels.edit().to_vec();
        for ch in edit {
            self.write_channel(&mut out, ch, n, in_frame)?;
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

/// Overwrite a range of `clip` with `params.sample`
pub fn set_samples(clip: NodeRef, params: &SetSamplesParams) -> Result<NodeRef> {
    let compositor = SetSamples::new(clip.info(), params)?;
    Ok(FilterNode::new(compositor, vec![clip]).into_node())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_util::{assert_close, clip, render};
    use crate::frame::Plane;
    use acx_common::{Error, SampleType};

    #[test]
    fn test_int16_range_overwrite() {
        let input = clip(SampleType::Int16, 4, &[vec![0.0; 10]]);
        let params = SetSamplesParams {
            sample: 1000.0,
            start_sample: Some(3),
            end_sample: Some(7),
            ..Default::default()
        };

        let out = render(&set_samples(input, &params).unwrap());
        assert_eq!(
            out.channel_plane(0),
            Plane::I16(vec![0, 0, 0, 1000, 1000, 1000, 1000, 0, 0, 0])
        );
    }

    #[test]
    fn test_int24_value_in_logical_units() {
        let input = clip(SampleType::Int24, 4, &[vec![0.0; 3]]);
        let params = SetSamplesParams {
            sample: -5.0,
            ..Default::default()
        };

        let out = render(&set_samples(input, &params).unwrap());
        assert_eq!(out.channel_plane(0), Plane::I32(vec![-5 << 8; 3]));
    }

    #[test]
    fn test_default_range_and_copy_channels() {
        let input = clip(SampleType::Float32, 4, &[vec![0.5; 6], vec![0.5; 6]]);
        let params = SetSamplesParams {
            sample: -0.25,
            channels: vec![1],
            ..Default::default()
        };

        let out = render(&set_samples(input, &params).unwrap());
        assert_close(&out.channel_normalized(0), &[0.5; 6], 0.0);
        assert_close(&out.channel_normalized(1), &[-0.25; 6], 0.0);
    }

    #[test]
    fn test_float_value_beyond_full_scale_overflows() {
        let input = clip(SampleType::Float64, 4, &[vec![0.0; 4]]);
        let params = SetSamplesParams {
            sample: 2.0,
            ..Default::default()
        };

        let err = set_samples(input, &params).unwrap().get_frame(0).unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));
    }
}

//! Normalize: scale a stream so its peak hits a target level
//!
//! The input peak is measured once at construction by reading the whole
//! stream, so building a `Normalize` blocks until the scan is done.

use super::{OverflowParams, SampleWriter};
use crate::channels::ChannelSet;
use crate::frame::{AudioFrame, AudioInfo};
use crate::host::{new_output_frame, AudioNode, Compositor, FilterNode, FrameRequest, InputFrames, NodeRef};
use crate::peak::{adjust_norm_peak, find_peak};
use acx_common::{Error, Result};
use std::sync::Arc;
use tracing::{debug, warn};

const FUNC_NAME: &str = "Normalize";

#[derive(Debug, Clone)]
pub struct NormalizeParams {
    /// Target peak, normalized
    pub peak: f64,
    /// Only ever attenuate
    pub lower_only: bool,
    pub channels: Vec<usize>,
    pub overflow: OverflowParams,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            peak: 1.0,
            lower_only: false,
            channels: Vec::new(),
            overflow: OverflowParams::default(),
        }
    }
}

pub struct Normalize {
    info: AudioInfo,
    out_peak: f64,
    gain: f64,
    channels: ChannelSet,
    writer: SampleWriter,
}

impl Normalize {
    /// Scans `clip` for its peak before returning
    pub fn new(clip: &dyn AudioNode, params: &NormalizeParams) -> Result<Self> {
        let info = *clip.info();

        if params.peak < 0.0 {
            return Err(Error::InvalidInput(format!("{}: negative peak", FUNC_NAME)));
        }
        if 1.0 < params.peak {
            warn!("{}: peak greater than 1 -> possible clipping", FUNC_NAME);
        }

        let channels = ChannelSet::new(FUNC_NAME, &params.channels, info.num_channels())?;
        let writer = SampleWriter::new(FUNC_NAME, params.overflow, info.sample_type())?;

        let out_peak = adjust_norm_peak(params.peak, info.sample_type());

        // blocking
        let in_peak = find_peak(clip, channels.edit(), true)?;

        let gain = if (params.lower_only && in_peak <= out_peak) || in_peak == 0.0 {
            1.0
        } else {
            out_peak / in_peak
        };

        debug!(
            "{}: input peak {:.6}, target {:.6}, gain {:.6}",
            FUNC_NAME, in_peak, out_peak, gain
        );

        Ok(Self {
            info,
            out_peak,
            gain,
            channels,
            writer,
        })
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    fn write_channel(&mut self, out: &mut AudioFrame, ch: usize, n: i64, in_frame: &AudioFrame) -> Result<()> {
        let out_pos_frame_start = self.info.grid().frame_to_first_sample(n);

        for s in 0..out.len() {
            let scaled = (self.gain * in_frame.normalized(ch, s)).clamp(-self.out_peak, self.out_peak);
            self.writer.write(out, ch, s, out_pos_frame_start + s as i64, scaled)?;
        }
        Ok(())
    }
}

impl Compositor for Normalize {
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

/// Normalize `clip` to `params.peak`
pub fn normalize(clip: NodeRef, params: &NormalizeParams) -> Result<NodeRef> {
    let compositor = Normalize::new(clip.as_ref(), params)?;
    Ok(FilterNode::new(compositor, vec![clip]).into_node())
}

//! FadeIn / FadeOut
//!
//! Both scale the samples of `[fade_start, fade_start + fade_samples)` by a
//! transition curve and leave everything else untouched. Output frames that
//! do not intersect the fade are the input frames themselves.
//!
//! - FadeIn: curve from 0 at the first fade sample to 1 at the last,
//!   starting at `start_sample` (default 0)
//! - FadeOut: curve from 1 to 0, ending at `end_sample` (default: stream end)

use super::{check_non_negative, OverflowParams, SampleWriter};
use crate::channels::ChannelSet;
use crate::frame::{AudioFrame, AudioInfo};
use crate::host::{new_output_frame, Compositor, FilterNode, FrameRequest, InputFrames, NodeRef};
use acx_common::timing::samples_or_seconds;
use acx_common::{Result, Transition, TransitionType};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct FadeInParams {
    /// Fade length; `samples` takes priority over `seconds`
    pub samples: Option<i64>,
    pub seconds: Option<f64>,
    /// First faded sample
    pub start_sample: Option<i64>,
    pub start_seconds: Option<f64>,
    pub fade_type: TransitionType,
    pub channels: Vec<usize>,
    pub overflow: OverflowParams,
}

#[derive(Debug, Clone, Default)]
pub struct FadeOutParams {
    /// Fade length; `samples` takes priority over `seconds`
    pub samples: Option<i64>,
    pub seconds: Option<f64>,
    /// Sample after the last faded sample
    pub end_sample: Option<i64>,
    pub end_seconds: Option<f64>,
    pub fade_type: TransitionType,
    pub channels: Vec<usize>,
    pub overflow: OverflowParams,
}

/// Shared fade compositor
pub struct Fade {
    func_name: &'static str,
    info: AudioInfo,
    // inclusive
    out_pos_fade_start: i64,
    // exclusive
    out_pos_fade_end: i64,
    // inclusive
    out_frame_fade_start: i64,
    // exclusive
    out_frame_fade_end: i64,
    transition: Transition,
    channels: ChannelSet,
    writer: SampleWriter,
}

impl Fade {
    /// Fade `fade_samples` samples from `out_pos_fade_start` along `transition`
    ///
    /// `transition` is expected to span positions `0..fade_samples`.
    pub fn new(
        func_name: &'static str,
        in_info: &AudioInfo,
        out_pos_fade_start: i64,
        fade_samples: i64,
        transition: Transition,
        channels: &[usize],
        overflow: OverflowParams,
    ) -> Result<Self> {
        check_non_negative(func_name, "fade length", fade_samples)?;

        let channels = ChannelSet::new(func_name, channels, in_info.num_channels())?;
        let writer = SampleWriter::new(func_name, overflow, in_info.sample_type())?;

        let out_pos_fade_end = out_pos_fade_start + fade_samples;

        // frames touched by the fade, clipped to the stream
        let grid = in_info.grid();
        let first = out_pos_fade_start.max(0);
        let last = out_pos_fade_end.min(in_info.num_samples);
        let (out_frame_fade_start, out_frame_fade_end) = if first < last {
            (grid.sample_to_frame(first), grid.sample_to_frame(last - 1) + 1)
        } else {
            (0, 0)
        };

        debug!(
            "{}: fade [{}, {}) -> frames [{}, {})",
            func_name, out_pos_fade_start, out_pos_fade_end, out_frame_fade_start, out_frame_fade_end
        );

        Ok(Self {
            func_name,
            info: *in_info,
            out_pos_fade_start,
            out_pos_fade_end,
            out_frame_fade_start,
            out_frame_fade_end,
            transition,
            channels,
            writer,
        })
    }

    #[cfg(test)]
    pub(crate) fn overflow_stats(&self) -> acx_common::OverflowStats {
        self.writer.stats()
    }

    fn is_fade_frame(&self, n: i64) -> bool {
        self.out_frame_fade_start <= n && n < self.out_frame_fade_end
    }

    fn write_channel(&mut self, out: &mut AudioFrame, ch: usize, n: i64, in_frame: &AudioFrame) -> Result<()> {
        let out_pos_frame_start = self.info.grid().frame_to_first_sample(n);

        for s in 0..out.len() {
            let out_pos = out_pos_frame_start + s as i64;
            let sample = in_frame.normalized(ch, s);

            let scaled = if self.out_pos_fade_start <= out_pos && out_pos < self.out_pos_fade_end {
                let fade_pos = out_pos - self.out_pos_fade_start;
                self.transition.calc_y(fade_pos as f64) * sample
            } else {
                sample
            };

            self.writer.write(out, ch, s, out_pos, scaled)?;
        }
        Ok(())
    }
}

impl Compositor for Fade {
    fn name(&self) -> &'static str {
        self.func_name
    }

    fn out_info(&self) -> &AudioInfo {
        &self.info
    }

    fn request_frames(&self, n: i64) -> Vec<FrameRequest> {
        vec![FrameRequest::new(0, n)]
    }

    fn produce_frame(&mut self, n: i64, inputs: &InputFrames) -> Result<Arc<AudioFrame>> {
        if !self.is_fade_frame(n) {
            return inputs.get_arc(0, n);
        }

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

/// Fade `clip` in from silence
pub fn fade_in(clip: NodeRef, params: &FadeInParams) -> Result<NodeRef> {
    let info = *clip.info();
    let fade_samples = samples_or_seconds(params.samples, params.seconds, info.sample_rate, 0);
    let start = samples_or_seconds(params.start_sample, params.start_seconds, info.sample_rate, 0);

    let compositor = Fade::new(
        "FadeIn",
        &info,
        start,
        fade_samples,
        Transition::fade_in(params.fade_type, fade_samples),
        &params.channels,
        params.overflow,
    )?;
    Ok(FilterNode::new(compositor, vec![clip]).into_node())
}

/// Fade `clip` out to silence
pub fn fade_out(clip: NodeRef, params: &FadeOutParams) -> Result<NodeRef> {
    let info = *clip.info();
    let fade_samples = samples_or_seconds(params.samples, params.seconds, info.sample_rate, 0);
    let end = samples_or_seconds(params.end_sample, params.end_seconds, info.sample_rate, info.num_samples);

    let compositor = Fade::new(
        "FadeOut",
        &info,
        end - fade_samples,
        fade_samples,
        Transition::fade_out(params.fade_type, fade_samples),
        &params.channels,
        params.overflow,
    )?;
    Ok(FilterNode::new(compositor, vec![clip]).into_node())
}

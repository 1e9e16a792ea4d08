//! Delay: shift a stream by a signed number of samples
//!
//! The output keeps the input length. A positive offset inserts silence at
//! the start and drops the tail; a negative offset drops the head and pads
//! silence at the end. Channels outside the edit set are copied unchanged.

use super::{OverflowParams, SampleWriter};
use crate::channels::ChannelSet;
use crate::frame::{AudioFrame, AudioInfo};
use crate::host::{new_output_frame, Compositor, FilterNode, FrameRequest, InputFrames, NodeRef};
use crate::offset::{base_frame_to_offset_frames, FrameSampleOffsets, OffsetFramePos, OffsetReader};
use acx_common::timing::samples_or_seconds;
use acx_common::Result;
use std::sync::Arc;
use tracing::debug;

const FUNC_NAME: &str = "Delay";

#[derive(Debug, Clone, Default)]
pub struct DelayParams {
    /// Offset in samples; takes priority over `seconds`
    pub samples: Option<i64>,
    pub seconds: Option<f64>,
    /// Channels to delay; empty means all
    pub channels: Vec<usize>,
    pub overflow: OverflowParams,
}

pub struct Delay {
    info: AudioInfo,
    /// Output position of input sample 0 (inclusive)
    out_pos_offset_start: i64,
    /// Output position after the last input sample (exclusive)
    out_pos_offset_end: i64,
    offsets: FrameSampleOffsets,
    channels: ChannelSet,
    writer: SampleWriter,
}

impl Delay {
    pub fn new(in_info: &AudioInfo, params: &DelayParams) -> Result<Self> {
        let offset = samples_or_seconds(params.samples, params.seconds, in_info.sample_rate, 0);
        let channels = ChannelSet::new(FUNC_NAME, &params.channels, in_info.num_channels())?;
        let writer = SampleWriter::new(FUNC_NAME, params.overflow, in_info.sample_type())?;

        debug!("{}: offset {} samples, edit channels {:?}", FUNC_NAME, offset, channels.edit());

        Ok(Self {
            info: *in_info,
            out_pos_offset_start: offset,
            out_pos_offset_end: offset + in_info.num_samples,
            offsets: FrameSampleOffsets::new(in_info.grid(), offset),
            channels,
            writer,
        })
    }

    fn in_frames(&self, n: i64) -> OffsetFramePos {
        base_frame_to_offset_frames(
            self.info.grid(),
            n,
            self.out_pos_offset_start,
            self.info.num_samples,
            self.info.num_samples,
        )
    }

    fn write_channel(&mut self, out: &mut AudioFrame, ch: usize, n: i64, reader: &OffsetReader) -> Result<()> {
        let out_pos_frame_start = self.info.grid().frame_to_first_sample(n);

        for s in 0..out.len() {
            let out_pos = out_pos_frame_start + s as i64;

            let sample = if out_pos < self.out_pos_offset_start || self.out_pos_offset_end <= out_pos {
                0.0
            } else {
                reader.normalized(ch, s)?
            };

            self.writer.write(out, ch, s, out_pos, sample)?;
        }
        Ok(())
    }
}

impl Compositor for Delay {
    fn name(&self) -> &'static str {
        FUNC_NAME
    }

    fn out_info(&self) -> &AudioInfo {
        &self.info
    }

    fn request_frames(&self, n: i64) -> Vec<FrameRequest> {
        let mut requests = Vec::new();

        if !self.channels.edit().is_empty() {
            requests.extend(self.in_frames(n).frames().map(|f| FrameRequest::new(0, f)));
        }

        if !self.channels.copy().is_empty() && !requests.contains(&FrameRequest::new(0, n)) {
            requests.push(FrameRequest::new(0, n));
        }

        if requests.is_empty() {
            // the host needs at least one dependency per output frame; pick
            // the input frame nearest in time so upstream work is reused
            let out_pos_frame_start = self.info.grid().frame_to_first_sample(n);
            let nearest = if self.out_pos_offset_end <= out_pos_frame_start {
                self.info.num_frames() - 1
            } else {
                0
            };
            requests.push(FrameRequest::new(0, nearest));
        }

        requests
    }

    fn produce_frame(&mut self, n: i64, inputs: &InputFrames) -> Result<Arc<AudioFrame>> {
        let mut out = new_output_frame(&self.info, n);

        if !self.channels.copy().is_empty() {
            let in_frame = inputs.require(0, n)?;
            for &ch in self.channels.copy() {
                out.copy_channel_from(ch, in_frame);
            }
        }

        let frames = self.in_frames(n);
        let reader = OffsetReader::new(
            self.offsets,
            self.info.sample_type(),
            inputs.get(0, frames.left),
            inputs.get(0, frames.right),
        );

        let edit = self.channels.edit().to_vec();
        for ch in edit {
            self.write_channel(&mut out, ch, n, &reader)?;
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

/// Delay `clip` by `params.samples` (or `params.seconds`)
pub fn delay(clip: NodeRef, params: &DelayParams) -> Result<NodeRef> {
    let compositor = Delay::new(clip.info(), params)?;
    Ok(FilterNode::new(compositor, vec![clip]).into_node())
}

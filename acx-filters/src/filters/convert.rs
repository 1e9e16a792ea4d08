//! Convert: change the sample type of a stream
//!
//! Identical input and output types pass the input frames through. Any other
//! pair is decoded to normalized values and re-encoded under the overflow
//! policy; only float inputs can actually overflow.

use super::{OverflowParams, SampleWriter};
use crate::frame::{AudioFrame, AudioInfo};
use crate::host::{new_output_frame, Compositor, FilterNode, FrameRequest, InputFrames, NodeRef};
use acx_common::{Error, Result, SampleType};
use std::sync::Arc;
use tracing::debug;

const FUNC_NAME: &str = "Convert";

#[derive(Debug, Clone)]
pub struct ConvertParams {
    /// One of the container types `i16`, `i24`, `i32`, `f32`
    pub sample_type: SampleType,
    pub overflow: OverflowParams,
}

impl Default for ConvertParams {
    fn default() -> Self {
        Self {
            sample_type: SampleType::Int16,
            overflow: OverflowParams::default(),
        }
    }
}

pub struct Convert {
    info: AudioInfo,
    in_sample_type: SampleType,
    writer: SampleWriter,
}

impl Convert {
    pub fn new(in_info: &AudioInfo, params: &ConvertParams) -> Result<Self> {
        if !params.sample_type.is_container_type() {
            return Err(Error::InvalidInput(format!(
                "{}: unsupported output sample type: {}",
                FUNC_NAME, params.sample_type
            )));
        }

        let writer = SampleWriter::new(FUNC_NAME, params.overflow, params.sample_type)?;

        debug!("{}: {} -> {}", FUNC_NAME, in_info.sample_type(), params.sample_type);

        Ok(Self {
            info: in_info.with_sample_type(params.sample_type),
            in_sample_type: in_info.sample_type(),
            writer,
        })
    }

    pub fn is_passthrough(&self) -> bool {
        self.in_sample_type == self.info.sample_type()
    }
}

impl Compositor for Convert {
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
        if self.is_passthrough() {
            return inputs.get_arc(0, n);
        }

        let in_frame = inputs.require(0, n)?;
        let mut out = new_output_frame(&self.info, n);
        let out_pos_frame_start = self.info.grid().frame_to_first_sample(n);

        for ch in 0..self.info.num_channels() {
            for s in 0..out.len() {
                let sample = in_frame.normalized(ch, s);
                self.writer.write(&mut out, ch, s, out_pos_frame_start + s as i64, sample)?;
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

/// Convert `clip` to `params.sample_type`
pub fn convert(clip: NodeRef, params: &ConvertParams) -> Result<NodeRef> {
    let compositor = Convert::new(clip.info(), params)?;
    Ok(FilterNode::new(compositor, vec![clip]).into_node())
}

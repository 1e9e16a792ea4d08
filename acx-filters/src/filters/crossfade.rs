//! CrossFade: append clip2 to clip1, overlapping the last `fade` samples
//!
//! Output length is `len1 + len2 - fade`. Inside the overlap clip1 follows a
//! fade-out curve `t` and clip2 the complement `1 - t`, so the gains always
//! sum to one. A zero-length crossfade is a plain splice.

use super::{check_non_negative, OverflowParams, SampleWriter};
use crate::frame::{AudioFrame, AudioInfo};
use crate::host::{check_same_format, new_output_frame, Compositor, FilterNode, FrameRequest, InputFrames, NodeRef};
use crate::offset::{base_frame_to_offset_frames, FrameSampleOffsets, OffsetFramePos, OffsetReader};
use acx_common::timing::samples_or_seconds;
use acx_common::{Error, Result, Transition, TransitionType};
use std::sync::Arc;
use tracing::debug;

const FUNC_NAME: &str = "CrossFade";

const CLIP1: usize = 0;
const CLIP2: usize = 1;

#[derive(Debug, Clone, Default)]
pub struct CrossFadeParams {
    /// Overlap length; `samples` takes priority over `seconds`
    pub samples: Option<i64>,
    pub seconds: Option<f64>,
    pub fade_type: TransitionType,
    pub overflow: OverflowParams,
}

pub struct CrossFade {
    info: AudioInfo,
    clip1_samples: i64,
    clip2_samples: i64,
    // inclusive
    out_pos_fade_start: i64,
    // exclusive
    out_pos_fade_end: i64,
    clip2_offsets: FrameSampleOffsets,
    /// Curve of clip1 over the overlap; `None` for a zero-length overlap
    fade_out: Option<Transition>,
    writer: SampleWriter,
}

impl CrossFade {
    pub fn new(clip1: &AudioInfo, clip2: &AudioInfo, params: &CrossFadeParams) -> Result<Self> {
        check_same_format(FUNC_NAME, clip1, clip2)?;

        let fade_samples = samples_or_seconds(params.samples, params.seconds, clip1.sample_rate, 0);
        check_non_negative(FUNC_NAME, "crossfade length", fade_samples)?;

        if clip1.num_samples < fade_samples {
            return Err(Error::InvalidInput(format!(
                "{}: clip1 is shorter than the crossfade length",
                FUNC_NAME
            )));
        }
        if clip2.num_samples < fade_samples {
            return Err(Error::InvalidInput(format!(
                "{}: clip2 is shorter than the crossfade length",
                FUNC_NAME
            )));
        }

        let writer = SampleWriter::new(FUNC_NAME, params.overflow, clip1.sample_type())?;

        let info = clip1.with_num_samples(clip1.num_samples + clip2.num_samples - fade_samples);
        let out_pos_fade_start = clip1.num_samples - fade_samples;
        let fade_out = (0 < fade_samples).then(|| Transition::fade_out(params.fade_type, fade_samples));

        debug!(
            "{}: overlap [{}, {}), output {} samples",
            FUNC_NAME, out_pos_fade_start, clip1.num_samples, info.num_samples
        );

        Ok(Self {
            info,
            clip1_samples: clip1.num_samples,
            clip2_samples: clip2.num_samples,
            out_pos_fade_start,
            out_pos_fade_end: clip1.num_samples,
            clip2_offsets: FrameSampleOffsets::new(info.grid(), out_pos_fade_start),
            fade_out,
            writer,
        })
    }

    /// clip1 is frame-aligned with the output
    fn clip1_frame(&self, n: i64) -> Option<i64> {
        base_frame_to_offset_frames(self.info.grid(), n, 0, self.clip1_samples, self.info.num_samples).left
    }

    fn clip2_frames(&self, n: i64) -> OffsetFramePos {
        base_frame_to_offset_frames(
            self.info.grid(),
            n,
            self.out_pos_fade_start,
            self.clip2_samples,
            self.info.num_samples,
        )
    }

    fn write_channel(
        &mut self,
        out: &mut AudioFrame,
        ch: usize,
        n: i64,
        clip1: Option<&AudioFrame>,
        clip2: &OffsetReader,
    ) -> Result<()> {
        let out_pos_frame_start = self.info.grid().frame_to_first_sample(n);

        for s in 0..out.len() {
            let out_pos = out_pos_frame_start + s as i64;

            let sample = if out_pos < self.out_pos_fade_start {
                clip1_sample(clip1, ch, s)?
            } else if self.out_pos_fade_end <= out_pos {
                clip2.normalized(ch, s)?
            } else {
                let fade_pos = (out_pos - self.out_pos_fade_start) as f64;
                let (scale1, scale2) = match &self.fade_out {
                    Some(t) => {
                        let y = t.calc_y(fade_pos);
                        (y, 1.0 - y)
                    }
                    None => (1.0, 0.0),
                };
                scale1 * clip1_sample(clip1, ch, s)? + scale2 * clip2.normalized(ch, s)?
            };

            self.writer.write(out, ch, s, out_pos, sample)?;
        }
        Ok(())
    }
}

fn clip1_sample(frame: Option<&AudioFrame>, ch: usize, s: usize) -> Result<f64> {
    match frame {
        Some(frame) if s < frame.len() => Ok(frame.normalized(ch, s)),
        _ => Err(Error::Internal(format!("{}: clip1 sample {} missing", FUNC_NAME, s))),
    }
}

impl Compositor for CrossFade {
    fn name(&self) -> &'static str {
        FUNC_NAME
    }

    fn out_info(&self) -> &AudioInfo {
        &self.info
    }

    fn request_frames(&self, n: i64) -> Vec<FrameRequest> {
        let mut requests: Vec<FrameRequest> = self
            .clip1_frame(n)
            .map(|f| FrameRequest::new(CLIP1, f))
            .into_iter()
            .collect();
        requests.extend(self.clip2_frames(n).frames().map(|f| FrameRequest::new(CLIP2, f)));
        requests
    }

    fn produce_frame(&mut self, n: i64, inputs: &InputFrames) -> Result<Arc<AudioFrame>> {
        let mut out = new_output_frame(&self.info, n);

        let clip1 = inputs.get(CLIP1, self.clip1_frame(n));
        let clip2_frames = self.clip2_frames(n);
        let clip2 = OffsetReader::new(
            self.clip2_offsets,
            self.info.sample_type(),
            inputs.get(CLIP2, clip2_frames.left),
            inputs.get(CLIP2, clip2_frames.right),
        );

        for ch in 0..self.info.num_channels() {
            self.write_channel(&mut out, ch, n, clip1, &clip2)?;
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

/// Crossfade from `clip1` into `clip2`
pub fn cross_fade(clip1: NodeRef, clip2: NodeRef, params: &CrossFadeParams) -> Result<NodeRef> {
    let compositor = CrossFade::new(clip1.info(), clip2.info(), params)?;
    Ok(FilterNode::new(compositor, vec![clip1, clip2]).into_node())
}

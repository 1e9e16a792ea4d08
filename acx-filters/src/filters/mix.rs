//! Mix: add clip2, placed at a signed offset, onto clip1
//!
//! # Layout
//!
//! clip2 starts `offset` samples after clip1 (before it when negative).
//! Where one clip sticks out of the other it is trimmed unless
//! `extend_start` / `extend_end` ask to keep it:
//!
//! ```text
//! offset < 0, extend_start:      offset < 0, trimmed:
//!   clip1:      |--------|         clip1: |--------|
//!   clip2: |-------|               clip2:  ...-----|   (head dropped)
//! ```
//!
//! When clip2 is kept in front of clip1, clip1 is the one that fades in;
//! when clip2 is kept past clip1's end, clip1 is the one that fades out.
//! Otherwise clip2 fades in and out over the overlap.
//!
//! Only edit channels receive clip2. Other channels carry clip1 alone
//! (scaled by its gain) and silence where clip1 has no samples.

use super::{check_non_negative, OverflowParams, SampleWriter};
use crate::channels::ChannelSet;
use crate::frame::{AudioFrame, AudioInfo};
use crate::host::{check_same_format, new_output_frame, Compositor, FilterNode, FrameRequest, InputFrames, NodeRef};
use crate::offset::{base_frame_to_offset_frames_trim, FrameSampleOffsets, OffsetFramePos, OffsetReader};
use acx_common::timing::samples_or_seconds;
use acx_common::{Error, Result, Transition, TransitionType};
use std::sync::Arc;
use tracing::debug;

const FUNC_NAME: &str = "Mix";

const CLIP1: usize = 0;
const CLIP2: usize = 1;

#[derive(Debug, Clone)]
pub struct MixParams {
    pub clip1_gain: f64,
    pub clip2_gain: f64,
    /// Scale both gains so they sum to 1
    pub relative_gain: bool,
    /// Position of clip2 relative to clip1; `clip2_offset_samples` takes priority
    pub clip2_offset_samples: Option<i64>,
    pub clip2_offset_seconds: Option<f64>,
    pub fadein_samples: Option<i64>,
    pub fadein_seconds: Option<f64>,
    pub fadeout_samples: Option<i64>,
    pub fadeout_seconds: Option<f64>,
    pub fade_type: TransitionType,
    pub extend_start: bool,
    pub extend_end: bool,
    /// Channels that receive clip2; empty means all
    pub channels: Vec<usize>,
    pub overflow: OverflowParams,
}

impl Default for MixParams {
    fn default() -> Self {
        Self {
            clip1_gain: 1.0,
            clip2_gain: 1.0,
            relative_gain: false,
            clip2_offset_samples: None,
            clip2_offset_seconds: None,
            fadein_samples: None,
            fadein_seconds: None,
            fadeout_samples: None,
            fadeout_seconds: None,
            fade_type: TransitionType::default(),
            extend_start: false,
            extend_end: false,
            channels: Vec::new(),
            overflow: OverflowParams::default(),
        }
    }
}

/// Output positions of one input clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClipPlacement {
    /// Output position of the clip's sample 0
    start: i64,
    // inclusive
    trim_start: i64,
    // exclusive
    trim_end: i64,
    num_samples: i64,
}

impl ClipPlacement {
    fn contains(&self, pos: i64) -> bool {
        self.trim_start <= pos && pos < self.trim_end
    }
}

/// A fade window over the overlap
#[derive(Debug, Clone, Copy)]
struct FadeWindow {
    start: i64,
    end: i64,
    transition: Transition,
    /// The curve scales clip2, otherwise clip1
    on_clip2: bool,
}

impl FadeWindow {
    /// `(clip1_scale, clip2_scale)` at `pos`
    fn scales(&self, pos: i64) -> (f64, f64) {
        if pos < self.start || self.end <= pos {
            return (1.0, 1.0);
        }
        let y = self.transition.calc_y((pos - self.start) as f64);
        if self.on_clip2 {
            (1.0, y)
        } else {
            (y, 1.0)
        }
    }
}

pub struct Mix {
    info: AudioInfo,
    clip1: ClipPlacement,
    clip2: ClipPlacement,
    clip1_offsets: FrameSampleOffsets,
    clip2_offsets: FrameSampleOffsets,
    clip1_scale: f64,
    clip2_scale: f64,
    fade_in: Option<FadeWindow>,
    fade_out: Option<FadeWindow>,
    channels: ChannelSet,
    writer: SampleWriter,
}

impl Mix {
    pub fn new(clip1_info: &AudioInfo, clip2_info: &AudioInfo, params: &MixParams) -> Result<Self> {
        check_same_format(FUNC_NAME, clip1_info, clip2_info)?;

        let rate = clip1_info.sample_rate;
        let len1 = clip1_info.num_samples;
        let len2 = clip2_info.num_samples;

        let offset = samples_or_seconds(params.clip2_offset_samples, params.clip2_offset_seconds, rate, 0);
        if (0 < offset && len1 < offset) || (offset < 0 && len2 < -offset) {
            return Err(Error::InvalidInput(format!(
                "{}: invalid clip2 start: clip2 does not overlap with clip1",
                FUNC_NAME
            )));
        }

        if params.clip1_gain < 0.0 {
            return Err(Error::InvalidInput(format!("{}: negative clip1_gain", FUNC_NAME)));
        }
        if params.clip2_gain < 0.0 {
            return Err(Error::InvalidInput(format!("{}: negative clip2_gain", FUNC_NAME)));
        }

        let fadein_samples = samples_or_seconds(params.fadein_samples, params.fadein_seconds, rate, 0);
        check_non_negative(FUNC_NAME, "fadein length", fadein_samples)?;
        let fadeout_samples = samples_or_seconds(params.fadeout_samples, params.fadeout_seconds, rate, 0);
        check_non_negative(FUNC_NAME, "fadeout length", fadeout_samples)?;

        let channels = ChannelSet::new(FUNC_NAME, &params.channels, clip1_info.num_channels())?;
        let writer = SampleWriter::new(FUNC_NAME, params.overflow, clip1_info.sample_type())?;

        let mut fadein_clip2 = true;
        let mut fadeout_clip2 = true;

        let (clip1_start, clip1_trim_start, clip2_start, clip2_trim_start) = if offset < 0 {
            if params.extend_start {
                fadein_clip2 = false;
                (-offset, -offset, 0, 0)
            } else {
                (0, 0, offset, 0)
            }
        } else {
            (0, 0, offset, offset)
        };

        let clip1_end = clip1_start + len1;
        let clip2_end = clip2_start + len2;
        let clip1_trim_end = clip1_end;

        let clip2_trim_end = if clip1_end < clip2_end {
            if params.extend_end {
                fadeout_clip2 = false;
                clip2_end
            } else {
                clip1_trim_end
            }
        } else {
            clip2_end
        };

        let clip1 = ClipPlacement {
            start: clip1_start,
            trim_start: clip1_trim_start,
            trim_end: clip1_trim_end,
            num_samples: len1,
        };
        let clip2 = ClipPlacement {
            start: clip2_start,
            trim_start: clip2_trim_start,
            trim_end: clip2_trim_end,
            num_samples: len2,
        };

        let out_len = clip1.trim_end.max(clip2.trim_end) - clip1.trim_start.min(clip2.trim_start);
        let info = clip1_info.with_num_samples(out_len);

        let mix_start = clip1.trim_start.max(clip2.trim_start);
        let mix_end = clip1.trim_end.min(clip2.trim_end);
        let mix_len = mix_end - mix_start;

        let fadein_samples = fadein_samples.min(mix_len);
        let fadeout_samples = fadeout_samples.min(mix_len);

        let fade_in = (0 < fadein_samples).then(|| FadeWindow {
            start: mix_start,
            end: mix_start + fadein_samples,
            transition: Transition::fade_in(params.fade_type, fadein_samples),
            on_clip2: fadein_clip2,
        });
        let fade_out = (0 < fadeout_samples).then(|| FadeWindow {
            start: mix_end - fadeout_samples,
            end: mix_end,
            transition: Transition::fade_out(params.fade_type, fadeout_samples),
            on_clip2: fadeout_clip2,
        });

        let (clip1_scale, clip2_scale) = if params.relative_gain {
            let total = params.clip1_gain + params.clip2_gain;
            if total == 0.0 {
                (0.0, 0.0)
            } else {
                (params.clip1_gain / total, params.clip2_gain / total)
            }
        } else {
            (params.clip1_gain, params.clip2_gain)
        };

        debug!("{}: clip1 length {}, clip2 length {}", FUNC_NAME, len1, len2);
        debug!(
            "{}: clip1 start {}, trim [{}, {})",
            FUNC_NAME, clip1.start, clip1.trim_start, clip1.trim_end
        );
        debug!(
            "{}: clip2 start {}, trim [{}, {})",
            FUNC_NAME, clip2.start, clip2.trim_start, clip2.trim_end
        );
        debug!(
            "{}: overlap [{}, {}), fade-in {}, fade-out {}",
            FUNC_NAME, mix_start, mix_end, fadein_samples, fadeout_samples
        );

        let grid = info.grid();
        Ok(Self {
            info,
            clip1,
            clip2,
            clip1_offsets: FrameSampleOffsets::new(grid, clip1.start),
            clip2_offsets: FrameSampleOffsets::new(grid, clip2.start),
            clip1_scale,
            clip2_scale,
            fade_in,
            fade_out,
            channels,
            writer,
        })
    }

    fn clip_frames(&self, clip: &ClipPlacement, n: i64) -> OffsetFramePos {
        base_frame_to_offset_frames_trim(
            self.info.grid(),
            n,
            clip.start,
            clip.num_samples,
            clip.trim_start,
            clip.trim_end,
            self.info.num_samples,
        )
    }

    fn fade_scales(&self, pos: i64) -> (f64, f64) {
        let (in1, in2) = self.fade_in.map_or((1.0, 1.0), |f| f.scales(pos));
        let (out1, out2) = self.fade_out.map_or((1.0, 1.0), |f| f.scales(pos));
        (in1 * out1, in2 * out2)
    }

    fn write_channel(
        &mut self,
        out: &mut AudioFrame,
        ch: usize,
        n: i64,
        clip1: &OffsetReader,
        clip2: &OffsetReader,
    ) -> Result<()> {
        let clip2_enabled = self.channels.is_edit(ch);
        let out_pos_frame_start = self.info.grid().frame_to_first_sample(n);

        for s in 0..out.len() {
            let out_pos = out_pos_frame_start + s as i64;
            let in_clip2 = clip2_enabled && self.clip2.contains(out_pos);

            let sample = if self.clip1.contains(out_pos) {
                let a1 = clip1.normalized(ch, s)?;
                if in_clip2 {
                    let a2 = clip2.normalized(ch, s)?;
                    let (fade1, fade2) = self.fade_scales(out_pos);
                    self.clip1_scale * fade1 * a1 + self.clip2_scale * fade2 * a2
                } else {
                    self.clip1_scale * a1
                }
            } else if in_clip2 {
                self.clip2_scale * clip2.normalized(ch, s)?
            } else {
                0.0
            };

            self.writer.write(out, ch, s, out_pos, sample)?;
        }
        Ok(())
    }
}

impl Compositor for Mix {
    fn name(&self) -> &'static str {
        FUNC_NAME
    }

    fn out_info(&self) -> &AudioInfo {
        &self.info
    }

    fn request_frames(&self, n: i64) -> Vec<FrameRequest> {
        let mut requests: Vec<FrameRequest> = self
            .clip_frames(&self.clip1, n)
            .frames()
            .map(|f| FrameRequest::new(CLIP1, f))
            .collect();
        requests.extend(
            self.clip_frames(&self.clip2, n)
                .frames()
                .map(|f| FrameRequest::new(CLIP2, f)),
        );

        if requests.is_empty() {
            requests.push(FrameRequest::new(CLIP1, 0));
        }

        requests
    }

    fn produce_frame(&mut self, n: i64, inputs: &InputFrames) -> Result<Arc<AudioFrame>> {
        let mut out = new_output_frame(&self.info, n);
        let sample_type = self.info.sample_type();

        let frames1 = self.clip_frames(&self.clip1, n);
        let clip1 = OffsetReader::new(
            self.clip1_offsets,
            sample_type,
            inputs.get(CLIP1, frames1.left),
            inputs.get(CLIP1, frames1.right),
        );

        let frames2 = self.clip_frames(&self.clip2, n);
        let clip2 = OffsetReader::new(
            self.clip2_offsets,
            sample_type,
            inputs.get(CLIP2, frames2.left),
            inputs.get(CLIP2, frames2.right),
        );

        for ch in 0..self.info.num_channels() {
            self.write_channel(&mut out, ch, n, &clip1, &clip2)?;
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

/// Mix `clip2` into `clip1`
pub fn mix(clip1: NodeRef, clip2: NodeRef, params: &MixParams) -> Result<NodeRef> {
    let compositor = Mix::new(clip1.info(), clip2.info(), params)?;
    Ok(FilterNode::new(compositor, vec![clip1, clip2]).into_node())
}

//! Frame-grid offset resolver
//!
//! Two streams share the frame size `F` but the *offset stream* starts at an
//! arbitrary sample position `d` of the *base stream* (`d` may be negative
//! or not a multiple of `F`). For a frame of the base stream this module
//! answers:
//!
//! - which frame(s) of the offset stream hold its samples
//!   ([`base_frame_to_offset_frames`]): at most two, a *left* frame covering
//!   the start of the base frame and a *right* frame covering its tail
//! - how to index into them ([`FrameSampleOffsets`]): a local index `s` of
//!   the base frame maps to `right_frame[s + right]` when `s >= -right`,
//!   otherwise to `left_frame[s + left]`
//!
//! ```text
//! base:    |--------frame n--------|
//! offset:  ...--left--|--right--...
//!                     ^ s = -right
//! ```
//!
//! No sample value conversion happens here; the reader returns stored
//! samples as they are.

use crate::frame::AudioFrame;
use crate::grid::FrameGrid;
use acx_common::codec::{self, NativeSample};
use acx_common::{Error, Result, SampleType};

/// In-frame index corrections for the left and right offset frame
///
/// `left >= 0`, `right <= 0`, and `left == 0` exactly when `right == 0`
/// (frame-aligned streams, only the left frame is ever read).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSampleOffsets {
    pub left: i64,
    pub right: i64,
}

impl FrameSampleOffsets {
    /// Offsets for an offset stream starting at base position `base_pos_offset_start`
    pub fn new(grid: FrameGrid, base_pos_offset_start: i64) -> Self {
        let right = frame_r_sample_offset(grid, base_pos_offset_start);
        let left = if right == 0 { 0 } else { right + grid.frame_samples() };
        Self { left, right }
    }

    pub fn is_aligned(&self) -> bool {
        self.left == 0
    }

    /// Which offset frame holds local sample `s`, and its index there
    pub fn locate(&self, s: usize) -> (FrameSide, usize) {
        let s = s as i64;
        if self.is_aligned() {
            (FrameSide::Left, s as usize)
        } else if -self.right <= s {
            (FrameSide::Right, (s + self.right) as usize)
        } else {
            (FrameSide::Left, (s + self.left) as usize)
        }
    }
}

/// Add to a base frame index to get the index in the right offset frame (<= 0)
fn frame_r_sample_offset(grid: FrameGrid, base_pos_offset_start: i64) -> i64 {
    -base_pos_offset_start.rem_euclid(grid.frame_samples())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSide {
    Left,
    Right,
}

/// Offset-stream frame numbers backing one base frame; `None` when not needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OffsetFramePos {
    pub left: Option<i64>,
    pub right: Option<i64>,
}

impl OffsetFramePos {
    pub const NONE: OffsetFramePos = OffsetFramePos { left: None, right: None };

    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Present frame numbers, left first
    pub fn frames(&self) -> impl Iterator<Item = i64> {
        self.left.into_iter().chain(self.right)
    }
}

/// Offset-stream frames needed to render `base_frame`
///
/// `base_pos_offset_start` is the base position of offset sample 0.
pub fn base_frame_to_offset_frames(
    grid: FrameGrid,
    base_frame: i64,
    base_pos_offset_start: i64,
    offset_total_samples: i64,
    base_total_samples: i64,
) -> OffsetFramePos {
    let base_pos_offset_end = base_pos_offset_start + offset_total_samples;

    let base_pos_frame_start = grid.frame_to_first_sample(base_frame);
    let base_pos_frame_end = grid.frame_to_last_sample(base_frame, base_total_samples);

    if base_pos_frame_end < 0 {
        // base frame outside of the base stream
        return OffsetFramePos::NONE;
    }

    if base_pos_offset_end <= base_pos_frame_start || base_pos_frame_end <= base_pos_offset_start {
        // base frame outside of the offset stream
        return OffsetFramePos::NONE;
    }

    if base_pos_frame_start < base_pos_offset_start {
        // offset frame 0 covers the tail of the base frame
        return OffsetFramePos {
            left: None,
            right: Some(0),
        };
    }

    let left_frame = grid.sample_to_frame(base_pos_frame_start - base_pos_offset_start);

    if frame_r_sample_offset(grid, base_pos_offset_start) == 0
        || grid.is_last_frame(left_frame, offset_total_samples)
    {
        return OffsetFramePos {
            left: Some(left_frame),
            right: None,
        };
    }

    OffsetFramePos {
        left: Some(left_frame),
        right: Some(left_frame + 1),
    }
}

/// Like [`base_frame_to_offset_frames`], dropping frames that lie entirely
/// outside the base-position window `[trim_start, trim_end)`
pub fn base_frame_to_offset_frames_trim(
    grid: FrameGrid,
    base_frame: i64,
    base_pos_offset_start: i64,
    offset_total_samples: i64,
    trim_start: i64,
    trim_end: i64,
    base_total_samples: i64,
) -> OffsetFramePos {
    let pos = base_frame_to_offset_frames(
        grid,
        base_frame,
        base_pos_offset_start,
        offset_total_samples,
        base_total_samples,
    );

    let inside_trim = |frame: i64| {
        let start = base_pos_offset_start + grid.frame_to_first_sample(frame);
        let end = base_pos_offset_start + grid.frame_to_last_sample(frame, offset_total_samples);
        !(trim_end <= start || end <= trim_start)
    };

    OffsetFramePos {
        left: pos.left.filter(|&f| inside_trim(f)),
        right: pos.right.filter(|&f| inside_trim(f)),
    }
}

/// Sample `s` of a base frame read from the left/right offset frame slices
///
/// Returns `None` if the frame that holds `s` was not supplied.
pub fn get_offset_sample<T: Copy>(
    s: usize,
    offsets: FrameSampleOffsets,
    left: Option<&[T]>,
    right: Option<&[T]>,
) -> Option<T> {
    match offsets.locate(s) {
        (FrameSide::Left, idx) => left.and_then(|l| l.get(idx).copied()),
        (FrameSide::Right, idx) => right.and_then(|r| r.get(idx).copied()),
    }
}

/// Reads base-frame samples out of the offset frames fetched for one output frame
pub struct OffsetReader<'a> {
    offsets: FrameSampleOffsets,
    sample_type: SampleType,
    left: Option<&'a AudioFrame>,
    right: Option<&'a AudioFrame>,
}

impl<'a> OffsetReader<'a> {
    pub fn new(
        offsets: FrameSampleOffsets,
        sample_type: SampleType,
        left: Option<&'a AudioFrame>,
        right: Option<&'a AudioFrame>,
    ) -> Self {
        Self {
            offsets,
            sample_type,
            left,
            right,
        }
    }

    /// Stored sample for local index `s` of channel `channel`
    pub fn native(&self, channel: usize, s: usize) -> Result<NativeSample> {
        let (side, idx) = self.offsets.locate(s);
        let frame = match side {
            FrameSide::Left => self.left,
            FrameSide::Right => self.right,
        };

        match frame {
            Some(frame) if idx < frame.len() => Ok(frame.native(channel, idx)),
            _ => Err(Error::Internal(format!(
                "sample {} is neither in the left nor in the right offset frame",
                s
            ))),
        }
    }

    pub fn normalized(&self, channel: usize, s: usize) -> Result<f64> {
        Ok(codec::to_normalized(self.native(channel, s)?, self.sample_type))
    }
}

//! Frame grid arithmetic
//!
//! A stream of `L` samples is stored in frames of `F` samples each. Frame `n`
//! covers `[n*F, n*F + count)` where `count` is `F` for every frame except
//! the last, which holds the remaining `1..=F` samples.

use serde::{Deserialize, Serialize};

/// Fixed frame size shared by all streams of one composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGrid {
    frame_samples: i64,
}

impl FrameGrid {
    /// Panics if `frame_samples` is zero.
    pub fn new(frame_samples: usize) -> Self {
        assert!(frame_samples > 0, "frame size must be positive");
        Self {
            frame_samples: frame_samples as i64,
        }
    }

    pub fn frame_samples(&self) -> i64 {
        self.frame_samples
    }

    /// Number of frames needed to hold `total_samples` (0 for an empty stream)
    pub fn samples_to_frames(&self, total_samples: i64) -> i64 {
        if total_samples <= 0 {
            return 0;
        }
        (total_samples - 1) / self.frame_samples + 1
    }

    /// Samples held by `frame`; 0 if the frame lies past the end
    pub fn frame_sample_count(&self, frame: i64, total_samples: i64) -> i64 {
        let total_frames = self.samples_to_frames(total_samples);

        if frame < 0 || total_frames <= frame {
            return 0;
        }

        if frame == total_frames - 1 {
            return total_samples - frame * self.frame_samples;
        }

        self.frame_samples
    }

    pub fn is_last_frame(&self, frame: i64, total_samples: i64) -> bool {
        frame == self.samples_to_frames(total_samples) - 1
    }

    /// First sample of `frame` (inclusive)
    pub fn frame_to_first_sample(&self, frame: i64) -> i64 {
        frame * self.frame_samples
    }

    /// Last sample of `frame` (exclusive), or -1 if the frame holds no samples
    pub fn frame_to_last_sample(&self, frame: i64, total_samples: i64) -> i64 {
        let count = self.frame_sample_count(frame, total_samples);
        if count == 0 {
            return -1;
        }
        self.frame_to_first_sample(frame) + count
    }

    pub fn sample_to_frame(&self, sample: i64) -> i64 {
        sample / self.frame_samples
    }
}

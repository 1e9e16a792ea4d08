//! Frame-grid resolver properties
//!
//! Exhaustive over small frame sizes, stream lengths and offsets: the offset
//! frames reported for a base frame must hold every offset sample the base
//! frame overlaps, and never name a frame outside the offset stream.

mod helpers;

use acx_filters::filters::{delay, mix, DelayParams, MixParams};
use acx_filters::grid::FrameGrid;
use acx_filters::offset::{base_frame_to_offset_frames, base_frame_to_offset_frames_trim};
use helpers::{f64_clip, ramp, render};
use std::collections::BTreeSet;

/// Offset frames actually backing base frame `n`
fn needed_frames(grid: FrameGrid, n: i64, offset: i64, offset_total: i64, base_total: i64) -> BTreeSet<i64> {
    let start = grid.frame_to_first_sample(n);
    let end = grid.frame_to_last_sample(n, base_total);
    (start..end)
        .map(|base_pos| base_pos - offset)
        .filter(|&pos| 0 <= pos && pos < offset_total)
        .map(|pos| grid.sample_to_frame(pos))
        .collect()
}

#[test]
fn test_offset_frames_cover_every_overlapping_sample() {
    for frame_samples in 1..=6usize {
        let grid = FrameGrid::new(frame_samples);

        for base_total in 1..=14i64 {
            for offset_total in 1..=14i64 {
                for offset in -16..=16i64 {
                    let offset_frames = grid.samples_to_frames(offset_total);

                    for n in 0..grid.samples_to_frames(base_total) {
                        let pos = base_frame_to_offset_frames(grid, n, offset, offset_total, base_total);
                        let returned: BTreeSet<i64> = pos.frames().collect();
                        let needed = needed_frames(grid, n, offset, offset_total, base_total);

                        let context = format!(
                            "F={} base_total={} offset_total={} offset={} frame={}",
                            frame_samples, base_total, offset_total, offset, n
                        );

                        assert!(needed.is_subset(&returned), "missing frames: {} {:?}", context, pos);
                        assert!(
                            returned.iter().all(|&f| 0 <= f && f < offset_frames),
                            "frame out of range: {} {:?}",
                            context,
                            pos
                        );
                        assert_eq!(needed.is_empty(), returned.is_empty(), "{} {:?}", context, pos);

                        if let (Some(left), Some(right)) = (pos.left, pos.right) {
                            assert_eq!(right, left + 1, "{}", context);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_trimmed_frames_stay_inside_window() {
    let grid = FrameGrid::new(4);
    let offset_total = 20;
    let base_total = 30;
    let offset = 3;
    // offset samples [5, 13) survive the trim
    let (trim_start, trim_end) = (offset + 5, offset + 13);

    for n in 0..grid.samples_to_frames(base_total) {
        let pos = base_frame_to_offset_frames_trim(grid, n, offset, offset_total, trim_start, trim_end, base_total);
        for frame in pos.frames() {
            let first = grid.frame_to_first_sample(frame);
            let end = grid.frame_to_last_sample(frame, offset_total);
            assert!(first < 13 && 5 < end, "frame {} kept for base frame {}", frame, n);
        }
    }
}

#[test]
fn test_delay_reconstructs_shifted_stream() {
    for frame_samples in 1..=8usize {
        for len in 1..=12usize {
            let input = ramp(len);

            for offset in -15..=15i64 {
                let params = DelayParams {
                    samples: Some(offset),
                    ..Default::default()
                };
                let out = render(&delay(f64_clip(frame_samples, &[input.clone()]), &params).unwrap());

                let expected: Vec<f64> = (0..len as i64)
                    .map(|pos| {
                        let src = pos - offset;
                        if 0 <= src && src < len as i64 {
                            input[src as usize]
                        } else {
                            0.0
                        }
                    })
                    .collect();

                assert_eq!(
                    out.channel_normalized(0),
                    expected,
                    "F={} len={} offset={}",
                    frame_samples,
                    len,
                    offset
                );
            }
        }
    }
}

/// Sample-by-sample model of Mix without gains or fades
fn reference_mix(clip1: &[f64], clip2: &[f64], offset: i64, extend_start: bool, extend_end: bool) -> Vec<f64> {
    let len1 = clip1.len() as i64;
    let len2 = clip2.len() as i64;

    let (start1, start2, trim_start2) = match (offset < 0, extend_start) {
        (true, true) => (-offset, 0, 0),
        (true, false) => (0, offset, 0),
        _ => (0, offset, offset),
    };
    let end1 = start1 + len1;
    let end2 = start2 + len2;
    let trim_end2 = if end1 < end2 && !extend_end { end1 } else { end2 };
    let trim_start1 = start1;

    let out_start = trim_start1.min(trim_start2);
    let out_end = end1.max(trim_end2);

    (out_start..out_end)
        .map(|pos| {
            let mut sum = 0.0;
            if trim_start1 <= pos && pos < end1 {
                sum += clip1[(pos - start1) as usize];
            }
            if trim_start2 <= pos && pos < trim_end2 {
                sum += clip2[(pos - start2) as usize];
            }
            sum
        })
        .collect()
}

#[test]
fn test_mix_matches_sample_model_on_every_grid() {
    for frame_samples in 1..=5usize {
        for len1 in 1..=7usize {
            for len2 in 1..=7usize {
                let clip1 = ramp(len1);
                let clip2: Vec<f64> = ramp(len2).iter().map(|x| x * 8.0).collect();

                for offset in -(len2 as i64)..=(len1 as i64) {
                    for (extend_start, extend_end) in [(false, false), (true, false), (false, true), (true, true)] {
                        let params = MixParams {
                            clip2_offset_samples: Some(offset),
                            extend_start,
                            extend_end,
                            ..Default::default()
                        };

                        let node = mix(
                            f64_clip(frame_samples, &[clip1.clone()]),
                            f64_clip(frame_samples, &[clip2.clone()]),
                            &params,
                        )
                        .unwrap();

                        let expected = reference_mix(&clip1, &clip2, offset, extend_start, extend_end);
                        assert_eq!(
                            render(&node).channel_normalized(0),
                            expected,
                            "F={} len1={} len2={} offset={} extend=({}, {})",
                            frame_samples,
                            len1,
                            len2,
                            offset,
                            extend_start,
                            extend_end
                        );
                    }
                }
            }
        }
    }
}

//! Compositor chains
//!
//! Streams pulled through several compositors at once, with frame sizes that
//! do not divide the stream lengths.

mod helpers;

use acx_common::{OverflowMode, SampleType, TransitionType};
use acx_filters::filters::{
    convert, cross_fade, delay, fade_in, fade_out, find_peak, mix, normalize, set_samples, sine_tone,
    ConvertParams, CrossFadeParams, DelayParams, FadeInParams, FadeOutParams, FindPeakParams, MixParams,
    NormalizeParams, OverflowParams, SetSamplesParams, SineToneParams,
};
use acx_filters::{AudioNode, Plane};
use helpers::{assert_close, clip, f64_clip, ramp, render};

fn overflow(mode: OverflowMode) -> OverflowParams {
    OverflowParams {
        mode,
        ..Default::default()
    }
}

#[test]
fn test_tone_fade_normalize_convert_chain() {
    let tone = sine_tone(&SineToneParams {
        sample_rate: 8000,
        samples: Some(1000),
        sample_type: SampleType::Float32,
        freq: 250.0,
        amplitude: 0.8,
        num_channels: 2,
        frame_samples: 64,
        ..Default::default()
    })
    .unwrap();

    let faded_in = fade_in(
        tone,
        &FadeInParams {
            samples: Some(100),
            fade_type: TransitionType::Linear,
            ..Default::default()
        },
    )
    .unwrap();
    let faded = fade_out(
        faded_in,
        &FadeOutParams {
            samples: Some(100),
            fade_type: TransitionType::Linear,
            ..Default::default()
        },
    )
    .unwrap();

    let normalized = normalize(
        faded,
        &NormalizeParams {
            peak: 0.5,
            ..Default::default()
        },
    )
    .unwrap();

    let converted = convert(
        normalized,
        &ConvertParams {
            sample_type: SampleType::Int24,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(converted.info().num_samples, 1000);
    assert_eq!(converted.info().sample_type(), SampleType::Int24);

    let out = render(&converted);
    for ch in 0..2 {
        let samples = out.channel_normalized(ch);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[999], 0.0);
    }

    let peak = find_peak(converted.as_ref(), &FindPeakParams::default()).unwrap();
    assert!((peak - 0.5).abs() < 1e-6, "peak {}", peak);
}

#[test]
fn test_crossfade_then_mix() {
    let clip1 = clip(SampleType::Int16, 16, &[vec![0.25; 40]]);
    let clip2 = clip(SampleType::Int16, 16, &[vec![0.25; 30]]);

    let spliced = cross_fade(
        clip1,
        clip2,
        &CrossFadeParams {
            samples: Some(10),
            fade_type: TransitionType::Linear,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(spliced.info().num_samples, 60);

    let overlay = clip(SampleType::Int16, 16, &[vec![0.125; 20]]);
    let params = MixParams {
        clip2_offset_samples: Some(50),
        ..Default::default()
    };

    let trimmed = mix(spliced.clone(), overlay.clone(), &params).unwrap();
    assert_eq!(trimmed.info().num_samples, 60);

    let extended = mix(
        spliced,
        overlay,
        &MixParams {
            extend_end: true,
            ..params
        },
    )
    .unwrap();
    assert_eq!(extended.info().num_samples, 70);

    let lsb = 1.0 / 32767.0;
    let mut expected = vec![0.25; 50];
    expected.extend(vec![0.375; 10]);
    assert_close(&render(&trimmed).channel_normalized(0), &expected, 2.0 * lsb);

    expected.extend(vec![0.125; 10]);
    assert_close(&render(&extended).channel_normalized(0), &expected, 2.0 * lsb);
}

#[test]
fn test_overflow_error_aborts_frame() {
    let loud = || clip(SampleType::Int16, 8, &[vec![0.75; 20]]);

    let node = mix(loud(), loud(), &MixParams::default()).unwrap();
    let err = node.get_frame(0).unwrap_err();
    assert!(
        err.to_string().starts_with("Mix: Overflow detected. position: 0, channel: 0, sample: 1.4"),
        "{}",
        err
    );

    let clipped = mix(
        loud(),
        loud(),
        &MixParams {
            overflow: overflow(OverflowMode::Clip),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(render(&clipped).channel_plane(0), Plane::I16(vec![32767; 20]));
}

#[test]
fn test_float_headroom_survives_until_convert() {
    let loud = || f64_clip(8, &[vec![0.75; 12]]);

    // clip_int leaves the float sum above full scale
    let summed = mix(
        loud(),
        loud(),
        &MixParams {
            overflow: overflow(OverflowMode::ClipInt),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(render(&summed).channel_normalized(0), vec![1.5; 12]);

    let strict = convert(summed.clone(), &ConvertParams::default()).unwrap();
    assert!(strict.get_frame(0).is_err());

    let saturated = convert(
        summed,
        &ConvertParams {
            overflow: overflow(OverflowMode::Clip),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(render(&saturated).channel_plane(0), Plane::I16(vec![32767; 12]));
}

#[test]
fn test_keep_float_needs_float_output() {
    let a = clip(SampleType::Int16, 8, &[vec![0.0; 4]]);
    let b = clip(SampleType::Int16, 8, &[vec![0.0; 4]]);

    let err = mix(
        a,
        b,
        &MixParams {
            overflow: overflow(OverflowMode::KeepFloat),
            ..Default::default()
        },
    )
    .err()
    .unwrap();
    assert_eq!(
        err.to_string(),
        "Invalid input: Mix: cannot use 'keep_float' overflow mode with an integer sample type"
    );
}

#[test]
fn test_set_samples_then_find_peak() {
    let silence = clip(SampleType::Int16, 7, &[vec![0.0; 100], vec![0.0; 100]]);
    let marked = set_samples(
        silence,
        &SetSamplesParams {
            sample: -20000.0,
            start_sample: Some(10),
            end_sample: Some(11),
            channels: vec![1],
            ..Default::default()
        },
    )
    .unwrap();

    let raw = FindPeakParams {
        normalize: false,
        ..Default::default()
    };
    assert_eq!(find_peak(marked.as_ref(), &raw).unwrap(), -20000.0);

    let left_only = FindPeakParams {
        channels: vec![0],
        ..Default::default()
    };
    assert_eq!(find_peak(marked.as_ref(), &left_only).unwrap(), 0.0);
}

#[test]
fn test_delay_in_seconds_rounds_to_samples() {
    let input = ramp(100);
    // 0.001 s at 44.1 kHz is 44.1 samples
    let delayed = delay(
        f64_clip(32, &[input.clone()]),
        &DelayParams {
            seconds: Some(0.001),
            ..Default::default()
        },
    )
    .unwrap();

    let out = render(&delayed).channel_normalized(0);
    assert!(out[..44].iter().all(|&x| x == 0.0));
    assert_eq!(&out[44..], &input[..56]);
}

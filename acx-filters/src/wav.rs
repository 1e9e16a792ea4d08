//! WAV import/export
//!
//! Maps WAV sample formats onto stream sample types:
//!
//! | WAV                | sample type |
//! |--------------------|-------------|
//! | 8-bit PCM          | `i8`        |
//! | 16-bit PCM         | `i16`       |
//! | 24-bit PCM         | `i24`       |
//! | 32-bit PCM         | `i32`       |
//! | 32-bit IEEE float  | `f32`       |
//!
//! 8-bit WAV data is unsigned on disk; hound re-centres it around zero.
//! `f64` streams have no WAV encoding and must be converted before writing.

use crate::error::{Error, Result};
use crate::frame::{AudioFormat, AudioInfo, Plane};
use crate::host::{AudioNode, MemoryClip};
use acx_common::SampleType;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::{debug, info};

fn sample_type_from_spec(spec: &WavSpec) -> Result<SampleType> {
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8) => Ok(SampleType::Int8),
        (SampleFormat::Int, 16) => Ok(SampleType::Int16),
        (SampleFormat::Int, 24) => Ok(SampleType::Int24),
        (SampleFormat::Int, 32) => Ok(SampleType::Int32),
        (SampleFormat::Float, 32) => Ok(SampleType::Float32),
        (format, bits) => Err(Error::UnsupportedFormat(format!(
            "{}-bit {:?} WAV data",
            bits, format
        ))),
    }
}

fn spec_from_info(info: &AudioInfo) -> Result<WavSpec> {
    let sample_type = info.sample_type();
    let sample_format = match sample_type {
        SampleType::Float32 => SampleFormat::Float,
        SampleType::Float64 => {
            return Err(Error::UnsupportedFormat(
                "f64 streams cannot be written as WAV, convert to f32 first".to_string(),
            ))
        }
        _ => SampleFormat::Int,
    };

    let channels = u16::try_from(info.num_channels())
        .map_err(|_| Error::UnsupportedFormat(format!("{} channels", info.num_channels())))?;

    Ok(WavSpec {
        channels,
        sample_rate: info.sample_rate,
        bits_per_sample: sample_type.bits() as u16,
        sample_format,
    })
}

/// Split interleaved samples into one vector per channel
fn deinterleave<T: Copy>(samples: Vec<T>, num_channels: usize) -> Vec<Vec<T>> {
    let mut channels: Vec<Vec<T>> = (0..num_channels)
        .map(|_| Vec::with_capacity(samples.len() / num_channels))
        .collect();
    for (i, sample) in samples.into_iter().enumerate() {
        channels[i % num_channels].push(sample);
    }
    channels
}

/// Read a whole WAV file into memory, cut into frames of `frame_samples`
pub fn read_wav<P: AsRef<Path>>(path: P, frame_samples: usize) -> Result<MemoryClip> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let sample_type = sample_type_from_spec(&spec)?;
    let num_channels = spec.channels as usize;

    let planes: Vec<Plane> = if sample_type.is_float() {
        let samples = reader.into_samples::<f32>().collect::<std::result::Result<Vec<_>, _>>()?;
        deinterleave(samples, num_channels).into_iter().map(Plane::F32).collect()
    } else {
        let shift = sample_type.storage_shift();
        let samples = reader.into_samples::<i32>().collect::<std::result::Result<Vec<_>, _>>()?;
        deinterleave(samples, num_channels)
            .into_iter()
            .map(|channel| match sample_type {
                SampleType::Int8 => Plane::I8(channel.into_iter().map(|x| x as i8).collect()),
                SampleType::Int16 => Plane::I16(channel.into_iter().map(|x| x as i16).collect()),
                _ => Plane::I32(channel.into_iter().map(|x| x << shift).collect()),
            })
            .collect()
    };

    let num_samples = planes.first().map(Plane::len).unwrap_or(0) as i64;
    let info = AudioInfo::new(
        AudioFormat::new(sample_type, num_channels),
        spec.sample_rate,
        num_samples,
        frame_samples,
    )?;

    info!(
        "Read {}: {} samples, {} channels, {} Hz, {}",
        path.display(),
        num_samples,
        num_channels,
        spec.sample_rate,
        sample_type
    );

    Ok(MemoryClip::from_planes(info, planes)?)
}

/// Render `node` frame by frame into a WAV file
///
/// Frames are requested in order, so overflow summaries of the compositors
/// in the chain are complete once this returns.
pub fn write_wav<P: AsRef<Path>>(node: &dyn AudioNode, path: P) -> Result<()> {
    let path = path.as_ref();
    let info = *node.info();
    let spec = spec_from_info(&info)?;
    let shift = info.sample_type().storage_shift();

    let mut writer = WavWriter::create(path, spec)?;

    for n in 0..info.num_frames() {
        let frame = node.get_frame(n)?;
        debug!("Writing frame {} ({} samples)", n, frame.len());

        for s in 0..frame.len() {
            for ch in 0..frame.num_channels() {
                match frame.plane(ch) {
                    Plane::I8(v) => writer.write_sample(v[s])?,
                    Plane::I16(v) => writer.write_sample(v[s])?,
                    Plane::I32(v) => writer.write_sample(v[s] >> shift)?,
                    Plane::F32(v) => writer.write_sample(v[s])?,
                    Plane::F64(_) => {
                        return Err(Error::UnsupportedFormat("f64 frame in a WAV stream".to_string()))
                    }
                }
            }
        }
    }

    writer.finalize()?;

    info!(
        "Wrote {}: {} samples, {} channels, {} Hz, {}",
        path.display(),
        info.num_samples,
        info.num_channels(),
        info.sample_rate,
        info.sample_type()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn clip(sample_type: SampleType, planes: Vec<Plane>) -> MemoryClip {
        let len = planes[0].len() as i64;
        let info = AudioInfo::new(AudioFormat::new(sample_type, planes.len()), 22050, len, 4).unwrap();
        MemoryClip::from_planes(info, planes).unwrap()
    }

    fn round_trip(original: &MemoryClip) -> MemoryClip {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav(original, &path).unwrap();
        read_wav(&path, 4).unwrap()
    }

    #[test]
    fn test_int24_round_trip_keeps_storage_shift() {
        let original = clip(
            SampleType::Int24,
            vec![
                Plane::I32(vec![8_388_607 << 8, -8_388_608 << 8, 1 << 8, 0, -5 << 8]),
                Plane::I32(vec![0, 7 << 8, 0, 0, 0]),
            ],
        );

        let read = round_trip(&original);
        assert_eq!(read.info(), original.info());
        assert_eq!(read.channel_plane(0), original.channel_plane(0));
        assert_eq!(read.channel_plane(1), original.channel_plane(1));
    }

    #[test]
    fn test_int8_round_trip_is_signed() {
        let original = clip(SampleType::Int8, vec![Plane::I8(vec![-128, -1, 0, 1, 127])]);
        let read = round_trip(&original);
        assert_eq!(read.channel_plane(0), Plane::I8(vec![-128, -1, 0, 1, 127]));
    }

    #[test]
    fn test_float32_round_trip() {
        let original = clip(SampleType::Float32, vec![Plane::F32(vec![0.25, -1.0, 1.5])]);
        let read = round_trip(&original);
        assert_eq!(read.channel_plane(0), Plane::F32(vec![0.25, -1.0, 1.5]));
    }

    #[test]
    fn test_float64_cannot_be_written() {
        let dir = TempDir::new().unwrap();
        let original = clip(SampleType::Float64, vec![Plane::F64(vec![0.0])]);
        let err = write_wav(&original, dir.path().join("f64.wav")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_layouts_without_sample_type() {
        for (sample_format, bits_per_sample) in [(SampleFormat::Int, 12), (SampleFormat::Float, 64)] {
            let spec = WavSpec {
                channels: 1,
                sample_rate: 44100,
                bits_per_sample,
                sample_format,
            };
            assert!(matches!(sample_type_from_spec(&spec), Err(Error::UnsupportedFormat(_))));
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(read_wav(dir.path().join("missing.wav"), 4).is_err());
    }
}

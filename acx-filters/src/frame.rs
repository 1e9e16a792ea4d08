//! Audio stream descriptors and frame buffers
//!
//! An [`AudioFrame`] holds one frame of every channel. Channel data is a
//! [`Plane`], a vector of native samples tagged by storage type. Int24
//! shares the `I32` storage with Int32 and is kept left-justified.

use crate::grid::FrameGrid;
use acx_common::codec::{self, NativeSample};
use acx_common::config::DEFAULT_FRAME_SAMPLES;
use acx_common::{Error, Result, SampleType};

/// Sample type and channel count of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_type: SampleType,
    pub num_channels: usize,
}

impl AudioFormat {
    pub fn new(sample_type: SampleType, num_channels: usize) -> Self {
        Self {
            sample_type,
            num_channels,
        }
    }
}

/// Stream descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    pub format: AudioFormat,
    pub sample_rate: u32,
    pub num_samples: i64,
    /// Samples per frame
    pub frame_samples: usize,
}

impl AudioInfo {
    pub fn new(format: AudioFormat, sample_rate: u32, num_samples: i64, frame_samples: usize) -> Result<Self> {
        if frame_samples == 0 {
            return Err(Error::InvalidInput("frame size must be positive".to_string()));
        }
        if format.num_channels == 0 {
            return Err(Error::InvalidInput("a stream needs at least one channel".to_string()));
        }
        if num_samples < 0 {
            return Err(Error::InvalidInput(format!("negative stream length: {}", num_samples)));
        }
        Ok(Self {
            format,
            sample_rate,
            num_samples,
            frame_samples,
        })
    }

    /// Descriptor using the default frame size
    pub fn with_default_frames(format: AudioFormat, sample_rate: u32, num_samples: i64) -> Result<Self> {
        Self::new(format, sample_rate, num_samples, DEFAULT_FRAME_SAMPLES)
    }

    pub fn grid(&self) -> FrameGrid {
        FrameGrid::new(self.frame_samples)
    }

    pub fn num_frames(&self) -> i64 {
        self.grid().samples_to_frames(self.num_samples)
    }

    /// Samples held by frame `n` of this stream
    pub fn frame_len(&self, n: i64) -> usize {
        self.grid().frame_sample_count(n, self.num_samples) as usize
    }

    pub fn sample_type(&self) -> SampleType {
        self.format.sample_type
    }

    pub fn num_channels(&self) -> usize {
        self.format.num_channels
    }

    /// Same stream layout with a different length
    pub fn with_num_samples(&self, num_samples: i64) -> Self {
        Self { num_samples, ..*self }
    }

    /// Same stream layout with a different sample type
    pub fn with_sample_type(&self, sample_type: SampleType) -> Self {
        Self {
            format: AudioFormat::new(sample_type, self.format.num_channels),
            ..*self
        }
    }
}

/// One channel of one frame in native storage
#[derive(Debug, Clone, PartialEq)]
pub enum Plane {
    I8(Vec<i8>),
    I16(Vec<i16>),
    /// Int24 (left-justified) and Int32
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Plane {
    pub fn zeroed(sample_type: SampleType, len: usize) -> Self {
        match sample_type {
            SampleType::Int8 => Plane::I8(vec![0; len]),
            SampleType::Int16 => Plane::I16(vec![0; len]),
            SampleType::Int24 | SampleType::Int32 => Plane::I32(vec![0; len]),
            SampleType::Float32 => Plane::F32(vec![0.0; len]),
            SampleType::Float64 => Plane::F64(vec![0.0; len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Plane::I8(v) => v.len(),
            Plane::I16(v) => v.len(),
            Plane::I32(v) => v.len(),
            Plane::F32(v) => v.len(),
            Plane::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored sample at `idx`
    pub fn get(&self, idx: usize) -> NativeSample {
        match self {
            Plane::I8(v) => NativeSample::Int(v[idx] as i64),
            Plane::I16(v) => NativeSample::Int(v[idx] as i64),
            Plane::I32(v) => NativeSample::Int(v[idx] as i64),
            Plane::F32(v) => NativeSample::F32(v[idx]),
            Plane::F64(v) => NativeSample::F64(v[idx]),
        }
    }

    /// Store `sample` at `idx`
    ///
    /// The codec always produces the plane's own kind; any other kind is cast
    /// (floats rounded and saturated into integer planes).
    pub fn set(&mut self, idx: usize, sample: NativeSample) {
        match self {
            Plane::I8(v) => v[idx] = sample.as_i64() as i8,
            Plane::I16(v) => v[idx] = sample.as_i64() as i16,
            Plane::I32(v) => v[idx] = sample.as_i64() as i32,
            Plane::F32(v) => v[idx] = sample.as_f64() as f32,
            Plane::F64(v) => v[idx] = sample.as_f64(),
        }
    }
}

/// One frame of all channels of a stream
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    sample_type: SampleType,
    len: usize,
    planes: Vec<Plane>,
}

impl AudioFrame {
    /// Silent frame
    pub fn new(sample_type: SampleType, num_channels: usize, len: usize) -> Self {
        Self {
            sample_type,
            len,
            planes: (0..num_channels).map(|_| Plane::zeroed(sample_type, len)).collect(),
        }
    }

    /// Build from planes that all match `sample_type` and have equal length
    pub fn from_planes(sample_type: SampleType, planes: Vec<Plane>) -> Result<Self> {
        let len = planes.first().map(Plane::len).unwrap_or(0);
        let expected = Plane::zeroed(sample_type, 0);

        for plane in &planes {
            if plane.len() != len || std::mem::discriminant(plane) != std::mem::discriminant(&expected) {
                return Err(Error::InvalidInput(format!(
                    "frame plane does not match {} x {} samples",
                    sample_type, len
                )));
            }
        }

        Ok(Self {
            sample_type,
            len,
            planes,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_channels(&self) -> usize {
        self.planes.len()
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn plane(&self, channel: usize) -> &Plane {
        &self.planes[channel]
    }

    pub fn native(&self, channel: usize, idx: usize) -> NativeSample {
        self.planes[channel].get(idx)
    }

    pub fn set_native(&mut self, channel: usize, idx: usize, sample: NativeSample) {
        self.planes[channel].set(idx, sample);
    }

    pub fn normalized(&self, channel: usize, idx: usize) -> f64 {
        codec::to_normalized(self.native(channel, idx), self.sample_type)
    }

    /// Raw copy of one channel from a frame of the same type and length
    pub fn copy_channel_from(&mut self, channel: usize, other: &AudioFrame) {
        debug_assert_eq!(self.sample_type, other.sample_type);
        debug_assert_eq!(self.len, other.len);
        self.planes[channel].clone_from(&other.planes[channel]);
    }
}

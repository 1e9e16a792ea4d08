//! Sample type descriptors
//!
//! Runtime description of the six supported sample representations. Every
//! per-type constant the codec needs (logical bit width, storage width,
//! symmetric integer range) is derived from a single table here instead of
//! being carried by generic parameters.
//!
//! Int24 is the only packed type: it is stored left-justified in a 32-bit
//! word, so reads shift right by 8 and writes shift left by 8.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported sample representations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    #[serde(rename = "i8")]
    Int8,
    #[serde(rename = "i16")]
    Int16,
    #[serde(rename = "i24")]
    Int24,
    #[serde(rename = "i32")]
    Int32,
    #[serde(rename = "f32")]
    Float32,
    #[serde(rename = "f64")]
    Float64,
}

impl SampleType {
    /// Logical bit width (24 for Int24)
    pub fn bits(&self) -> u32 {
        match self {
            SampleType::Int8 => 8,
            SampleType::Int16 => 16,
            SampleType::Int24 => 24,
            SampleType::Int32 | SampleType::Float32 => 32,
            SampleType::Float64 => 64,
        }
    }

    /// Bytes occupied by one stored sample
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleType::Int8 => 1,
            SampleType::Int16 => 2,
            SampleType::Int24 | SampleType::Int32 | SampleType::Float32 => 4,
            SampleType::Float64 => 8,
        }
    }

    /// Bits occupied by one stored sample
    pub fn storage_bits(&self) -> u32 {
        self.bytes_per_sample() as u32 * 8
    }

    /// Left shift applied to the logical value when it is stored (0 unless packed)
    pub fn storage_shift(&self) -> u32 {
        if self.is_float() {
            0
        } else {
            self.storage_bits() - self.bits()
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SampleType::Float32 | SampleType::Float64)
    }

    pub fn is_int(&self) -> bool {
        !self.is_float()
    }

    /// Largest positive integer value, `2^(bits-1) - 1`
    ///
    /// Float types have no integer range; 0 is returned for them.
    pub fn max_int(&self) -> i64 {
        if self.is_float() {
            0
        } else {
            (1i64 << (self.bits() - 1)) - 1
        }
    }

    /// Most negative integer value, `-2^(bits-1)`; the one value outside the
    /// symmetric range `[-max_int, max_int]`
    pub fn min_int(&self) -> i64 {
        if self.is_float() {
            0
        } else {
            -(1i64 << (self.bits() - 1))
        }
    }

    /// Types accepted as an output format of the WAV container and of Convert
    pub fn is_container_type(&self) -> bool {
        matches!(
            self,
            SampleType::Int16 | SampleType::Int24 | SampleType::Int32 | SampleType::Float32
        )
    }

    /// Parse from the short name used in configuration (`i8|i16|i24|i32|f32|f64`)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i8" => Some(SampleType::Int8),
            "i16" => Some(SampleType::Int16),
            "i24" => Some(SampleType::Int24),
            "i32" => Some(SampleType::Int32),
            "f32" => Some(SampleType::Float32),
            "f64" => Some(SampleType::Float64),
            _ => None,
        }
    }

    /// Parse and additionally require a container type
    pub fn from_container_str(s: &str) -> Option<Self> {
        Self::from_str(s).filter(|st| st.is_container_type())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::Int8 => "i8",
            SampleType::Int16 => "i16",
            SampleType::Int24 => "i24",
            SampleType::Int32 => "i32",
            SampleType::Float32 => "f32",
            SampleType::Float64 => "f64",
        }
    }

    pub fn all_variants() -> &'static [SampleType] {
        &[
            SampleType::Int8,
            SampleType::Int16,
            SampleType::Int24,
            SampleType::Int32,
            SampleType::Float32,
            SampleType::Float64,
        ]
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_ranges() {
        assert_eq!(SampleType::Int8.max_int(), 127);
        assert_eq!(SampleType::Int8.min_int(), -128);
        assert_eq!(SampleType::Int16.max_int(), 32767);
        assert_eq!(SampleType::Int24.max_int(), 8_388_607);
        assert_eq!(SampleType::Int24.min_int(), -8_388_608);
        assert_eq!(SampleType::Int32.max_int(), i32::MAX as i64);
        assert_eq!(SampleType::Int32.min_int(), i32::MIN as i64);
    }

    #[test]
    fn test_storage_shift() {
        assert_eq!(SampleType::Int24.storage_shift(), 8);
        assert_eq!(SampleType::Int24.bytes_per_sample(), 4);
        for st in [SampleType::Int8, SampleType::Int16, SampleType::Int32, SampleType::Float32, SampleType::Float64] {
            assert_eq!(st.storage_shift(), 0, "{} must not be packed", st);
        }
    }

    #[test]
    fn test_from_str_round_trip() {
        for st in SampleType::all_variants() {
            assert_eq!(SampleType::from_str(st.as_str()), Some(*st));
        }
        assert_eq!(SampleType::from_str("F32"), Some(SampleType::Float32));
        assert_eq!(SampleType::from_str("u8"), None);
    }

    #[test]
    fn test_container_subset() {
        assert_eq!(SampleType::from_container_str("i24"), Some(SampleType::Int24));
        assert_eq!(SampleType::from_container_str("i8"), None);
        assert_eq!(SampleType::from_container_str("f64"), None);
    }

    #[test]
    fn test_serde_names() {
        #[derive(Deserialize)]
        struct Holder {
            v: SampleType,
        }

        let holder: Holder = toml::from_str("v = \"i24\"").unwrap();
        assert_eq!(holder.v, SampleType::Int24);
    }
}

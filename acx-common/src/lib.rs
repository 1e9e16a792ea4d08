//! # ACX Common Library
//!
//! Shared building blocks for sample-accurate audio composition:
//! - Sample type descriptors and the normalized sample codec
//! - Overflow detection, clipping and reporting
//! - Transition curves (linear, cubic, sine)
//! - Sample/seconds conversions
//! - Configuration loading

pub mod codec;
pub mod config;
pub mod error;
pub mod overflow;
pub mod sample_type;
pub mod timing;
pub mod transition;

#[cfg(test)]
pub(crate) mod test_util;

pub use codec::NativeSample;
pub use error::{Error, Result};
pub use overflow::{OverflowLog, OverflowMode, OverflowPolicy, OverflowStats};
pub use sample_type::SampleType;
pub use transition::{Transition, TransitionType};

//! # ACX Filters (acx-filters)
//!
//! Sample-accurate composition of PCM audio streams.
//!
//! **Purpose:** Delay, fade, crossfade, mix, normalize, convert and overwrite
//! frame-based audio streams without ever losing or duplicating a sample,
//! with every written sample passing the overflow policy.
//!
//! **Architecture:** Streams are pulled frame by frame through
//! [`host::AudioNode`]. Each compositor declares the input frames it needs,
//! then renders one output frame from them; [`offset`] maps frames between
//! streams that start at arbitrary sample positions.

pub mod channels;
pub mod error;
pub mod filters;
pub mod frame;
pub mod grid;
pub mod host;
pub mod offset;
pub mod peak;
pub mod wav;

pub use error::{Error, Result};
pub use frame::{AudioFormat, AudioFrame, AudioInfo, Plane};
pub use host::{AudioNode, MemoryClip, NodeRef};

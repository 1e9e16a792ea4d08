//! Error types for acx-filters
//!
//! Compositor errors come from `acx_common::Error`; this type adds the WAV
//! container layer on top.

use thiserror::Error;

/// Main error type for the filters crate
#[derive(Error, Debug)]
pub enum Error {
    /// Compositor, codec or configuration error
    #[error(transparent)]
    Core(#[from] acx_common::Error),

    /// WAV reading or writing error
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV layout that has no matching sample type
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience Result type using the acx-filters Error
pub type Result<T> = std::result::Result<T, Error>;

//! Common error types for ACX

use thiserror::Error;

/// Common result type for ACX operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by all compositors
///
/// Messages are prefixed with the name of the originating compositor
/// (e.g. `"Mix: negative clip1_gain"`) by the code raising them.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file loading or parsing error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid or contradictory compositor parameter, detected at construction
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two input streams that must share a format do not
    #[error("Format mismatch: {0}")]
    FormatMismatch(String),

    /// Sample overflow under a failing overflow mode; aborts the current output frame
    #[error("{0}")]
    Overflow(String),

    /// Frame request outside the stream or other host misuse
    #[error("Internal error: {0}")]
    Internal(String),
}

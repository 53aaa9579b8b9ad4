//! Error types for Cutlist.

use thiserror::Error;

/// Main error type for Cutlist operations.
///
/// Every variant is recoverable: the operation that produced it leaves the
/// editing session untouched.
#[derive(Error, Debug)]
pub enum CutlistError {
    #[error("Time {value:.3}s is outside the media range [0, {duration:.3}]")]
    OutOfRange { value: f64, duration: f64 },

    #[error("A cut point already exists at {value:.3}s")]
    Duplicate { value: f64 },

    #[error("Index {index} is out of bounds (count {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("No cut points to undo")]
    Empty,

    #[error("Invalid timecode: {0:?} (expected HH:MM:SS:mmm, HH:MM:SS, MM:SS:mmm or MM:SS)")]
    InvalidFormat(String),

    #[error("Nothing to keep: every section is marked for deletion")]
    NothingToKeep,

    #[error("Missing asset: {0}")]
    MissingAsset(String),

    #[error("Encoder error: {0}")]
    Encode(String),

    #[error("A build is already running")]
    BuildInProgress,

    #[error("No media loaded")]
    NoMediaLoaded,

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Cutlist operations.
pub type Result<T> = std::result::Result<T, CutlistError>;

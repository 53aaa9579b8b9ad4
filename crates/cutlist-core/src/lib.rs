//! Cutlist Core - Foundation types for section editing
//!
//! This crate provides the fundamental types used throughout Cutlist:
//! - Time representation (seconds, TimeRange, cut-point tolerance)
//! - Timecode parsing and formatting
//! - The shared error taxonomy
//! - Layered configuration

pub mod config;
pub mod error;
pub mod time;
pub mod timecode;

pub use config::{CutlistConfig, EditingConfig, ExportDefaults, ToolPaths};
pub use error::{CutlistError, Result};
pub use time::{approx_eq, TimeRange, CUT_POINT_EPSILON};
pub use timecode::{TimecodeCodec, TimecodeFormat};

/// Editing defaults shared by the session and the front end.
pub mod defaults {
    /// Silence inserted between kept sections, in seconds.
    pub const SILENCE_GAP: f64 = 1.0;

    /// Pointer distance (in pixels) within which a marker counts as hit.
    pub const MARKER_HIT_RADIUS: f32 = 5.0;

    /// Output frame rate for video-with-background renders.
    pub const FRAME_RATE: u32 = 24;

    /// Output canvas for video-with-background renders.
    pub const CANVAS_WIDTH: u32 = 1920;
    pub const CANVAS_HEIGHT: u32 = 1080;

    /// Sample rate used for silence and for normalizing kept ranges.
    pub const SAMPLE_RATE: u32 = 44_100;
}

//! Cutlist Media - collaborators around the editing core
//!
//! This crate handles:
//! - Media sources (duration probing via ffprobe)
//! - Executing assembly plans with FFmpeg
//! - Cancellable section previews

pub mod export;
pub mod preview;
pub mod probe;

pub use export::{
    export_session, Artifact, ExportGate, ExportOptions, ExportPermit, FfmpegSink, MediaSink,
    OutputKind,
};
pub use preview::{FfplayPreview, PreviewController, PreviewEngine};
pub use probe::{MediaSource, ProbedSource, RangeHandle, StaticSource};

/// Log the media subsystem's tool configuration (call once at startup).
pub fn init(tools: &cutlist_core::ToolPaths) {
    tracing::info!(
        ffmpeg = %tools.ffmpeg,
        ffprobe = %tools.ffprobe,
        ffplay = %tools.ffplay,
        "Cutlist media initialized"
    );
}

//! Layered configuration.
//!
//! Defaults are compiled in, overridden by an optional JSON file, then by a
//! small set of environment variables. Nothing here is required for the
//! editing core to work: a session built from `CutlistConfig::default()` is
//! fully functional.

use crate::error::{CutlistError, Result};
use crate::{defaults, CUT_POINT_EPSILON};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Overrides the ffmpeg binary used by the export sink.
pub const ENV_FFMPEG: &str = "CUTLIST_FFMPEG";
/// Overrides the session's default silence gap.
pub const ENV_SILENCE_GAP: &str = "CUTLIST_SILENCE_GAP";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CutlistConfig {
    pub editing: EditingConfig,
    pub export: ExportDefaults,
    pub tools: ToolPaths,
}

/// Settings for the editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingConfig {
    /// Silence between kept sections, in seconds.
    pub silence_gap: f64,
    /// Cut points closer than this (seconds) are duplicates.
    pub cut_point_epsilon: f64,
    /// Marker hit-test radius in pixels.
    pub marker_hit_radius: f32,
}

impl Default for EditingConfig {
    fn default() -> Self {
        Self {
            silence_gap: defaults::SILENCE_GAP,
            cut_point_epsilon: CUT_POINT_EPSILON,
            marker_hit_radius: defaults::MARKER_HIT_RADIUS,
        }
    }
}

/// Defaults applied to new export jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub sample_rate: u32,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            frame_rate: defaults::FRAME_RATE,
            width: defaults::CANVAS_WIDTH,
            height: defaults::CANVAS_HEIGHT,
            video_codec: "libx264".into(),
            audio_codec: "libmp3lame".into(),
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// External binaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub ffplay: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
            ffplay: "ffplay".into(),
        }
    }
}

impl CutlistConfig {
    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cutlist")
            .join("config.json")
    }

    /// Load from `path`, or from [`Self::default_path`] when `None`.
    /// A missing file yields the defaults; a malformed one is an error.
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        let mut config = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            let config: Self = serde_json::from_str(&json).map_err(|e| {
                CutlistError::Config(format!("Failed to parse {}: {e}", path.display()))
            })?;
            info!(path = %path.display(), "Loaded configuration");
            config
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            CutlistError::Serialization(format!("Failed to serialize config: {e}"))
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Apply environment overrides through a lookup function.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ffmpeg) = lookup(ENV_FFMPEG).filter(|v| !v.trim().is_empty()) {
            self.tools.ffmpeg = ffmpeg;
        }
        if let Some(raw) = lookup(ENV_SILENCE_GAP) {
            match raw.trim().parse::<f64>() {
                Ok(gap) if gap.is_finite() => self.editing.silence_gap = gap.max(0.0),
                _ => warn!(value = %raw, "Ignoring invalid {ENV_SILENCE_GAP}"),
            }
        }
    }

    /// Reject settings the editing core cannot work with.
    pub fn validate(&self) -> Result<()> {
        let e = &self.editing;
        if !e.cut_point_epsilon.is_finite() || e.cut_point_epsilon <= 0.0 {
            return Err(CutlistError::Config(format!(
                "cut_point_epsilon must be positive, got {}",
                e.cut_point_epsilon
            )));
        }
        if !e.silence_gap.is_finite() || e.silence_gap < 0.0 {
            return Err(CutlistError::Config(format!(
                "silence_gap must be non-negative, got {}",
                e.silence_gap
            )));
        }
        if !e.marker_hit_radius.is_finite() || e.marker_hit_radius <= 0.0 {
            return Err(CutlistError::Config(format!(
                "marker_hit_radius must be positive, got {}",
                e.marker_hit_radius
            )));
        }
        let x = &self.export;
        if x.frame_rate == 0 || x.width == 0 || x.height == 0 || x.sample_rate == 0 {
            return Err(CutlistError::Config(
                "export frame_rate, width, height and sample_rate must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

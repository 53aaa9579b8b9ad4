//! Media sources and duration probing.

use cutlist_core::{CutlistError, Result, TimeRange};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// A handle to a sub-range of a media source, as handed to an encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeHandle {
    pub path: Option<PathBuf>,
    pub range: TimeRange,
}

/// Opaque provider of media: a duration plus range extraction.
pub trait MediaSource: Send + Sync {
    /// Total length in seconds.
    fn duration(&self) -> f64;

    /// File backing this source, if any.
    fn path(&self) -> Option<&Path>;

    /// Reference `[start, end)` of this source.
    fn extract_range(&self, start: f64, end: f64) -> Result<RangeHandle> {
        let duration = self.duration();
        for value in [start, end] {
            if !value.is_finite() || value < 0.0 || value > duration {
                return Err(CutlistError::OutOfRange { value, duration });
            }
        }
        if end < start {
            return Err(CutlistError::OutOfRange {
                value: end,
                duration,
            });
        }
        Ok(RangeHandle {
            path: self.path().map(Path::to_path_buf),
            range: TimeRange::new(start, end),
        })
    }
}

// ── Static source ───────────────────────────────────────────────

/// A source whose duration is supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticSource {
    path: Option<PathBuf>,
    duration: f64,
}

impl StaticSource {
    pub fn new(duration: f64) -> Self {
        Self {
            path: None,
            duration,
        }
    }

    pub fn with_path(path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            path: Some(path.into()),
            duration,
        }
    }
}

impl MediaSource for StaticSource {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

// ── ffprobe ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    format_name: Option<String>,
}

/// A media file whose duration was read with `ffprobe`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbedSource {
    path: PathBuf,
    duration: f64,
    /// Container format name as reported by ffprobe
    pub format: String,
    pub has_audio: bool,
    pub has_video: bool,
}

impl ProbedSource {
    /// Probe `path` with the `ffprobe` binary at `ffprobe`.
    pub fn probe(path: impl AsRef<Path>, ffprobe: &str) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CutlistError::Probe(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let output = Command::new(ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration,format_name:stream=codec_type",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|e| CutlistError::Probe(format!("Failed to run {ffprobe}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CutlistError::Probe(stderr.trim().to_string()));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        let source = Self::from_ffprobe_json(path, &json)?;
        debug!(
            path = %path.display(),
            duration = source.duration,
            format = %source.format,
            "Probed media"
        );
        Ok(source)
    }

    /// Build a source from `ffprobe -of json` output.
    pub fn from_ffprobe_json(path: impl Into<PathBuf>, json: &str) -> Result<Self> {
        let parsed: ProbeOutput = serde_json::from_str(json)
            .map_err(|e| CutlistError::Probe(format!("Unreadable ffprobe output: {e}")))?;
        let format = parsed
            .format
            .ok_or_else(|| CutlistError::Probe("ffprobe reported no format".into()))?;

        let duration = format
            .duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| CutlistError::Probe("ffprobe reported no duration".into()))?;

        let has_kind = |kind: &str| {
            parsed
                .streams
                .iter()
                .any(|s| s.codec_type.as_deref() == Some(kind))
        };

        Ok(Self {
            path: path.into(),
            duration,
            format: format.format_name.unwrap_or_default(),
            has_audio: has_kind("audio"),
            has_video: has_kind("video"),
        })
    }
}

impl MediaSource for ProbedSource {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

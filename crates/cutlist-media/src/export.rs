//! Executing assembly plans.
//!
//! A [`MediaSink`] receives the plan and encodes it. [`FfmpegSink`] drives
//! FFmpeg through the sidecar process: kept ranges are trimmed out of the
//! source audio, gaps are synthesized silence, and everything is joined
//! with `concat`. Video output loops a still background image under the
//! assembled audio.

use cutlist_core::{CutlistError, ExportDefaults, Result};
use cutlist_timeline::{AssemblyPlan, EditingSession, PlanStep};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::probe::MediaSource;

// ── Options ─────────────────────────────────────────────────────

/// What the sink produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    /// Assembled audio only.
    AudioOnly,
    /// Assembled audio over a still image.
    VideoWithBackground,
}

impl OutputKind {
    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::AudioOnly => "mp3",
            Self::VideoWithBackground => "mp4",
        }
    }
}

/// Encoder settings for one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub kind: OutputKind,
    pub output_path: PathBuf,
    pub background_image: Option<PathBuf>,
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub sample_rate: u32,
}

impl ExportOptions {
    /// Audio-only output using the configured defaults.
    pub fn audio_only(output_path: impl Into<PathBuf>, defaults: &ExportDefaults) -> Self {
        Self {
            kind: OutputKind::AudioOnly,
            output_path: output_path.into(),
            background_image: None,
            frame_rate: defaults.frame_rate,
            width: defaults.width,
            height: defaults.height,
            video_codec: defaults.video_codec.clone(),
            audio_codec: defaults.audio_codec.clone(),
            sample_rate: defaults.sample_rate,
        }
    }

    /// Video output over `background_image`.
    pub fn video_with_background(
        output_path: impl Into<PathBuf>,
        background_image: Option<PathBuf>,
        defaults: &ExportDefaults,
    ) -> Self {
        Self {
            kind: OutputKind::VideoWithBackground,
            background_image,
            ..Self::audio_only(output_path, defaults)
        }
    }

    /// Check that every asset the output kind needs is present.
    pub fn validate(&self) -> Result<()> {
        if self.kind == OutputKind::VideoWithBackground {
            match &self.background_image {
                None => {
                    return Err(CutlistError::MissingAsset(
                        "Video output needs a background image".into(),
                    ))
                }
                Some(image) if !image.is_file() => {
                    return Err(CutlistError::MissingAsset(format!(
                        "Background image not found: {}",
                        image.display()
                    )))
                }
                Some(_) => {}
            }
        }
        if self.sample_rate == 0 || self.frame_rate == 0 || self.width == 0 || self.height == 0 {
            return Err(CutlistError::Config(
                "Sample rate, frame rate and canvas size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

// ── Sink ────────────────────────────────────────────────────────

/// A finished build.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: OutputKind,
    /// Length of the produced media in seconds.
    pub duration: f64,
}

/// Consumer of assembly plans.
pub trait MediaSink {
    /// Encode `plan` from `source`. Blocks until the encoder finishes.
    fn execute(
        &self,
        source: &dyn MediaSource,
        plan: &AssemblyPlan,
        options: &ExportOptions,
    ) -> Result<Artifact>;
}

/// Sink that shells out to FFmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegSink {
    ffmpeg: String,
}

impl FfmpegSink {
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// The `-filter_complex` graph for `plan`. Audio ends up on `[aout]`,
    /// video (if any) on `[vout]`.
    pub fn filter_graph(plan: &AssemblyPlan, options: &ExportOptions) -> String {
        let rate = options.sample_rate;
        let mut chains = Vec::with_capacity(plan.len() + 2);
        let mut labels = String::new();

        for (i, step) in plan.steps().iter().enumerate() {
            let chain = match *step {
                PlanStep::KeepRange { start, end } => format!(
                    "[0:a]atrim=start={start}:end={end},asetpts=PTS-STARTPTS,\
                     aformat=sample_rates={rate}:channel_layouts=stereo[s{i}]"
                ),
                PlanStep::SilenceGap { duration } => format!(
                    "anullsrc=r={rate}:cl=stereo,atrim=duration={duration},\
                     asetpts=PTS-STARTPTS[s{i}]"
                ),
            };
            chains.push(chain);
            labels.push_str(&format!("[s{i}]"));
        }
        chains.push(format!("{labels}concat=n={}:v=0:a=1[aout]", plan.len()));

        if options.kind == OutputKind::VideoWithBackground {
            chains.push(format!(
                "[1:v]scale={w}:{h},setsar=1,format=yuv420p[vout]",
                w = options.width,
                h = options.height
            ));
        }
        chains.join(";")
    }

    /// Full FFmpeg argument list for encoding `plan` from `input`.
    pub fn ffmpeg_args(input: &Path, plan: &AssemblyPlan, options: &ExportOptions) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into(), "-i".into(), input.display().to_string()];

        let video = match (&options.kind, &options.background_image) {
            (OutputKind::VideoWithBackground, Some(image)) => {
                args.extend_from_slice(&[
                    "-loop".into(),
                    "1".into(),
                    "-framerate".into(),
                    options.frame_rate.to_string(),
                    "-i".into(),
                    image.display().to_string(),
                ]);
                true
            }
            _ => false,
        };

        args.extend_from_slice(&[
            "-filter_complex".into(),
            Self::filter_graph(plan, options),
            "-map".into(),
            "[aout]".into(),
        ]);

        if video {
            args.extend_from_slice(&[
                "-map".into(),
                "[vout]".into(),
                "-c:v".into(),
                options.video_codec.clone(),
                "-r".into(),
                options.frame_rate.to_string(),
                "-pix_fmt".into(),
                "yuv420p".into(),
                // the looped image is endless; stop at the end of the audio
                "-t".into(),
                plan.total_duration().to_string(),
            ]);
        } else {
            args.push("-vn".into());
        }

        args.extend_from_slice(&[
            "-c:a".into(),
            options.audio_codec.clone(),
            "-ar".into(),
            options.sample_rate.to_string(),
        ]);

        args.push(options.output_path.display().to_string());
        args
    }
}

impl MediaSink for FfmpegSink {
    fn execute(
        &self,
        source: &dyn MediaSource,
        plan: &AssemblyPlan,
        options: &ExportOptions,
    ) -> Result<Artifact> {
        let input = source
            .path()
            .ok_or_else(|| CutlistError::MissingAsset("Media source has no file".into()))?;
        for range in plan.keep_ranges() {
            source.extract_range(range.start, range.end)?;
        }

        let args = Self::ffmpeg_args(input, plan, options);
        debug!(args = ?args, "Spawning ffmpeg");

        let mut child = FfmpegCommand::new_with_path(&self.ffmpeg)
            .args(&args)
            .spawn()
            .map_err(|e| CutlistError::Encode(format!("Failed to spawn ffmpeg: {e}")))?;

        let mut errors = Vec::new();
        let events = child
            .iter()
            .map_err(|e| CutlistError::Encode(format!("Failed to read ffmpeg output: {e}")))?;
        for event in events {
            match event {
                FfmpegEvent::Progress(progress) => {
                    debug!(time = %progress.time, "Encoding");
                }
                FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, msg) | FfmpegEvent::Error(msg) => {
                    warn!(%msg, "ffmpeg");
                    errors.push(msg);
                }
                _ => {}
            }
        }

        let status = child
            .wait()
            .map_err(|e| CutlistError::Encode(format!("Failed to wait for ffmpeg: {e}")))?;
        if !status.success() {
            let msg = if errors.is_empty() {
                format!("ffmpeg exited with status: {status}")
            } else {
                errors.join("\n")
            };
            return Err(CutlistError::Encode(msg));
        }

        Ok(Artifact {
            path: options.output_path.clone(),
            kind: options.kind,
            duration: plan.total_duration(),
        })
    }
}

// ── Build gate ──────────────────────────────────────────────────

/// Admits one build at a time.
#[derive(Debug, Clone, Default)]
pub struct ExportGate(Arc<AtomicBool>);

impl ExportGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, failing with `BuildInProgress` if a build holds it.
    pub fn try_begin(&self) -> Result<ExportPermit> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CutlistError::BuildInProgress)?;
        Ok(ExportPermit(Arc::clone(&self.0)))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Held for the duration of a build; releases the gate on drop.
#[derive(Debug)]
pub struct ExportPermit(Arc<AtomicBool>);

impl Drop for ExportPermit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Plan the session and hand it to `sink`.
///
/// Fails with `NothingToKeep` if every section is deleted, `MissingAsset` if
/// the options need an image that is absent, and `BuildInProgress` if
/// another build holds `gate`. The sink is not invoked in any of these cases.
pub fn export_session(
    session: &EditingSession,
    source: &dyn MediaSource,
    sink: &dyn MediaSink,
    options: &ExportOptions,
    gate: &ExportGate,
) -> Result<Artifact> {
    let plan = session.build_plan()?;
    options.validate()?;
    let _permit = gate.try_begin()?;

    info!(
        session = %session.id(),
        kind = ?options.kind,
        output = %options.output_path.display(),
        "Building output"
    );
    let artifact = sink.execute(source, &plan, options)?;
    info!(
        output = %artifact.path.display(),
        duration = artifact.duration,
        "Build finished"
    );
    Ok(artifact)
}

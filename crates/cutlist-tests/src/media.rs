//! Integration tests for export and preview.
//!
//! Uses in-process sinks and engines in place of FFmpeg and ffplay.

use crossbeam_channel::{bounded, Receiver, Sender};
use cutlist_core::{CutlistError, ExportDefaults, Result};
use cutlist_media::{
    export_session, Artifact, ExportGate, ExportOptions, MediaSink, MediaSource,
    PreviewController, PreviewEngine, StaticSource,
};
use cutlist_timeline::{AssemblyPlan, EditingSession, InteractionMode, SectionState};
use parking_lot::Mutex;
use std::thread;
use std::time::Duration;

// ── Helpers ────────────────────────────────────────────────────

fn edited_session() -> EditingSession {
    let mut session = EditingSession::default();
    session.load_media(30.0, Some("talk.wav".into())).unwrap();
    session.add_cut_point(10.0).unwrap();
    session.add_cut_point(20.0).unwrap();
    session.set_section_state(1, SectionState::Delete).unwrap();
    session
}

fn options() -> ExportOptions {
    ExportOptions::audio_only("out.mp3", &ExportDefaults::default())
}

/// Holds every build open until released.
struct BlockingSink {
    started: Sender<()>,
    release: Receiver<()>,
}

impl MediaSink for BlockingSink {
    fn execute(
        &self,
        source: &dyn MediaSource,
        plan: &AssemblyPlan,
        options: &ExportOptions,
    ) -> Result<Artifact> {
        for range in plan.keep_ranges() {
            source.extract_range(range.start, range.end)?;
        }
        let _ = self.started.send(());
        let _ = self.release.recv();
        Ok(Artifact {
            path: options.output_path.clone(),
            kind: options.kind,
            duration: plan.total_duration(),
        })
    }
}

/// Records plays and stops.
#[derive(Default)]
struct ScriptedEngine {
    log: Vec<String>,
    playing: bool,
}

impl PreviewEngine for ScriptedEngine {
    fn play(&mut self, start: f64, end: f64) -> Result<()> {
        self.log.push(format!("play {start}-{end}"));
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        if self.playing {
            self.log.push("stop".into());
        }
        self.playing = false;
    }

    fn is_playing(&mut self) -> bool {
        self.playing
    }
}

// ── Export ─────────────────────────────────────────────────────

#[test]
fn second_concurrent_build_is_refused() {
    let session = edited_session();
    let source = StaticSource::with_path("talk.wav", 30.0);
    let gate = ExportGate::new();
    let (started_tx, started_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    let sink = BlockingSink {
        started: started_tx,
        release: release_rx,
    };

    thread::scope(|scope| {
        let first = scope.spawn(|| export_session(&session, &source, &sink, &options(), &gate));
        started_rx.recv().unwrap();

        let second = export_session(&session, &source, &sink, &options(), &gate);
        assert!(matches!(second, Err(CutlistError::BuildInProgress)));

        release_tx.send(()).unwrap();
        let artifact = first.join().unwrap().unwrap();
        assert_eq!(artifact.duration, 21.0);
    });

    // released after completion
    assert!(!gate.is_busy());
}

#[test]
fn video_without_image_is_missing_asset() {
    let session = edited_session();
    let gate = ExportGate::new();
    let (started_tx, started_rx) = bounded(1);
    let (_release_tx, release_rx) = bounded(1);
    let sink = BlockingSink {
        started: started_tx,
        release: release_rx,
    };
    let video = ExportOptions::video_with_background("out.mp4", None, &ExportDefaults::default());

    let result = export_session(
        &session,
        &StaticSource::new(30.0),
        &sink,
        &video,
        &gate,
    );
    assert!(matches!(result, Err(CutlistError::MissingAsset(_))));
    // the sink never started
    assert!(started_rx.try_recv().is_err());
    assert!(!gate.is_busy());
}

#[test]
fn video_with_image_on_disk_reaches_sink() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("cover.jpg");
    std::fs::write(&image, b"jpeg").unwrap();

    let (started_tx, started_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    release_tx.send(()).unwrap();
    let sink = BlockingSink {
        started: started_tx,
        release: release_rx,
    };
    let video = ExportOptions::video_with_background(
        dir.path().join("out.mp4"),
        Some(image),
        &ExportDefaults::default(),
    );

    let artifact = export_session(
        &edited_session(),
        &StaticSource::with_path("talk.wav", 30.0),
        &sink,
        &video,
        &ExportGate::new(),
    )
    .unwrap();
    assert!(started_rx.try_recv().is_ok());
    assert_eq!(artifact.path, dir.path().join("out.mp4"));
}

#[test]
fn plan_outside_source_is_rejected_by_sink() {
    // session thinks the media is longer than the source really is
    let session = edited_session();
    let (started_tx, _started_rx) = bounded(1);
    let (_release_tx, release_rx) = bounded(1);
    let sink = BlockingSink {
        started: started_tx,
        release: release_rx,
    };
    let result = export_session(
        &session,
        &StaticSource::new(25.0),
        &sink,
        &options(),
        &ExportGate::new(),
    );
    assert!(matches!(result, Err(CutlistError::OutOfRange { .. })));
}

// ── Preview ────────────────────────────────────────────────────

#[test]
fn preview_of_picked_section_replaces_running_preview() {
    let session = edited_session();
    let mut preview = PreviewController::new(ScriptedEngine::default());

    let bar = session.marker_index(300.0, InteractionMode::ReadOnly).unwrap();
    let first = bar.section_at(50.0).unwrap();
    let second = bar.section_at(250.0).unwrap();
    assert_eq!((first, second), (0, 2));

    preview.preview(session.section_range(first).unwrap()).unwrap();
    preview.preview(session.section_range(second).unwrap()).unwrap();

    let engine = preview.engine();
    assert_eq!(
        engine.lock().log,
        vec!["play 0-10", "stop", "play 20-30"]
    );
}

#[test]
fn stale_stop_timer_leaves_newer_preview_playing() {
    let mut preview = PreviewController::new(ScriptedEngine::default());
    preview
        .preview(cutlist_core::TimeRange::new(0.0, 0.03))
        .unwrap();
    preview
        .preview(cutlist_core::TimeRange::new(10.0, 40.0))
        .unwrap();

    thread::sleep(Duration::from_millis(250));
    assert!(preview.is_playing());

    let shared: std::sync::Arc<Mutex<ScriptedEngine>> = preview.engine();
    drop(preview);
    assert_eq!(
        shared.lock().log,
        vec!["play 0-0.03", "stop", "play 10-40", "stop"]
    );
}

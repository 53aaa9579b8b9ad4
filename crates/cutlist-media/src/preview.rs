//! Section preview playback.
//!
//! At most one preview plays at a time. Each preview arms a stop timer on a
//! helper thread; starting another preview, cancelling, or dropping the
//! controller disarms it. Timers carry the generation they were armed for,
//! so one that fires late never stops a newer preview.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use cutlist_core::{CutlistError, Result, TimeRange};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// A playback backend.
pub trait PreviewEngine: Send {
    /// Start playing `[start, end)` of the loaded media.
    fn play(&mut self, start: f64, end: f64) -> Result<()>;
    /// Stop playback. A no-op when nothing plays.
    fn stop(&mut self);
    fn is_playing(&mut self) -> bool;
}

struct StopTimer {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

impl StopTimer {
    fn disarm(self) {
        let _ = self.cancel.send(());
        if self.handle.join().is_err() {
            warn!("Preview stop timer panicked");
        }
    }
}

/// Runs previews on an engine, one at a time.
pub struct PreviewController<E: PreviewEngine + 'static> {
    engine: Arc<Mutex<E>>,
    generation: Arc<AtomicU64>,
    timer: Option<StopTimer>,
}

impl<E: PreviewEngine + 'static> PreviewController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            generation: Arc::new(AtomicU64::new(0)),
            timer: None,
        }
    }

    /// Shared handle to the engine.
    pub fn engine(&self) -> Arc<Mutex<E>> {
        Arc::clone(&self.engine)
    }

    /// Play `range`, replacing any running preview.
    pub fn preview(&mut self, range: TimeRange) -> Result<()> {
        if !range.start.is_finite() || !range.end.is_finite() || range.start < 0.0 {
            return Err(CutlistError::OutOfRange {
                value: range.start,
                duration: range.end,
            });
        }
        if range.duration() <= 0.0 {
            self.cancel();
            return Ok(());
        }
        // reject before playing: the engine never runs without a stop timer
        let wait = Duration::try_from_secs_f64(range.duration()).map_err(|_| {
            CutlistError::OutOfRange {
                value: range.end,
                duration: range.end,
            }
        })?;
        self.cancel();

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.engine.lock().play(range.start, range.end)?;
        debug!(start = range.start, end = range.end, generation, "Preview started");

        let (tx, rx) = bounded::<()>(1);
        let engine = Arc::clone(&self.engine);
        let current = Arc::clone(&self.generation);
        let handle = thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(wait) {
                let mut engine = engine.lock();
                if current.load(Ordering::Acquire) == generation {
                    engine.stop();
                    debug!(generation, "Preview reached end of range");
                }
            }
        });
        self.timer = Some(StopTimer { cancel: tx, handle });
        Ok(())
    }

    /// Stop the running preview and disarm its timer.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(timer) = self.timer.take() {
            timer.disarm();
        }
        let mut engine = self.engine.lock();
        if engine.is_playing() {
            engine.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.engine.lock().is_playing()
    }
}

impl<E: PreviewEngine + 'static> Drop for PreviewController<E> {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ── ffplay ──────────────────────────────────────────────────────

/// Plays ranges of a media file in an `ffplay` window.
pub struct FfplayPreview {
    ffplay: String,
    media: PathBuf,
    child: Option<Child>,
}

impl FfplayPreview {
    pub fn new(ffplay: impl Into<String>, media: impl Into<PathBuf>) -> Self {
        Self {
            ffplay: ffplay.into(),
            media: media.into(),
            child: None,
        }
    }

    pub fn args(&self, start: f64, end: f64) -> Vec<String> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-autoexit".into(),
            "-ss".into(),
            start.to_string(),
            "-t".into(),
            (end - start).to_string(),
            self.media.display().to_string(),
        ]
    }
}

impl PreviewEngine for FfplayPreview {
    fn play(&mut self, start: f64, end: f64) -> Result<()> {
        self.stop();
        let child = Command::new(&self.ffplay)
            .args(self.args(start, end))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CutlistError::Playback(format!("Failed to spawn {}: {e}", self.ffplay)))?;
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn is_playing(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(_) => {
                self.child = None;
                false
            }
            None => false,
        }
    }
}

impl Drop for FfplayPreview {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FakeEngine {
        playing: Option<(f64, f64)>,
        plays: Vec<(f64, f64)>,
        stops: usize,
    }

    impl PreviewEngine for FakeEngine {
        fn play(&mut self, start: f64, end: f64) -> Result<()> {
            self.playing = Some((start, end));
            self.plays.push((start, end));
            Ok(())
        }

        fn stop(&mut self) {
            if self.playing.take().is_some() {
                self.stops += 1;
            }
        }

        fn is_playing(&mut self) -> bool {
            self.playing.is_some()
        }
    }

    #[test]
    fn test_timer_stops_at_end_of_range() {
        let mut controller = PreviewController::new(FakeEngine::default());
        controller.preview(TimeRange::new(2.0, 2.05)).unwrap();
        assert!(controller.is_playing());

        thread::sleep(Duration::from_millis(400));
        assert!(!controller.is_playing());
        assert_eq!(controller.engine().lock().stops, 1);
    }

    #[test]
    fn test_new_preview_stops_previous() {
        let mut controller = PreviewController::new(FakeEngine::default());
        controller.preview(TimeRange::new(0.0, 10.0)).unwrap();
        controller.preview(TimeRange::new(20.0, 30.0)).unwrap();

        let engine = controller.engine();
        let engine = engine.lock();
        assert_eq!(engine.plays, vec![(0.0, 10.0), (20.0, 30.0)]);
        assert_eq!(engine.stops, 1);
        assert_eq!(engine.playing, Some((20.0, 30.0)));
    }

    #[test]
    fn test_stale_timer_does_not_stop_newer_preview() {
        let mut controller = PreviewController::new(FakeEngine::default());
        controller.preview(TimeRange::new(0.0, 0.05)).unwrap();
        controller.preview(TimeRange::new(5.0, 15.0)).unwrap();

        thread::sleep(Duration::from_millis(300));
        assert!(controller.is_playing());
        assert_eq!(controller.engine().lock().stops, 1);
    }

    #[test]
    fn test_cancel_disarms_timer() {
        let mut controller = PreviewController::new(FakeEngine::default());
        controller.preview(TimeRange::new(0.0, 0.05)).unwrap();
        controller.cancel();
        assert!(!controller.is_playing());

        thread::sleep(Duration::from_millis(200));
        assert_eq!(controller.engine().lock().stops, 1);
    }

    #[test]
    fn test_drop_stops_playback() {
        let mut controller = PreviewController::new(FakeEngine::default());
        controller.preview(TimeRange::new(0.0, 60.0)).unwrap();
        let engine = controller.engine();
        drop(controller);
        assert!(engine.lock().playing.is_none());
    }

    #[test]
    fn test_empty_range_plays_nothing() {
        let mut controller = PreviewController::new(FakeEngine::default());
        controller.preview(TimeRange::new(5.0, 5.0)).unwrap();
        assert!(controller.engine().lock().plays.is_empty());
        assert!(controller.preview(TimeRange::new(f64::NAN, 1.0)).is_err());
    }

    #[test]
    fn test_unrepresentable_length_is_rejected_without_playing() {
        let mut controller = PreviewController::new(FakeEngine::default());
        controller.preview(TimeRange::new(0.0, 10.0)).unwrap();

        let result = controller.preview(TimeRange::new(0.0, 1e20));
        assert!(matches!(result, Err(CutlistError::OutOfRange { .. })));

        // the running preview is left alone
        let engine = controller.engine();
        let engine = engine.lock();
        assert_eq!(engine.plays, vec![(0.0, 10.0)]);
        assert_eq!(engine.playing, Some((0.0, 10.0)));
    }

    #[test]
    fn test_ffplay_spawn_failure_is_playback_error() {
        let mut preview = FfplayPreview::new("/nonexistent/cutlist-ffplay", "talk.mp4");
        assert!(matches!(
            preview.play(0.0, 1.0),
            Err(CutlistError::Playback(_))
        ));
        assert!(!preview.is_playing());
    }

    #[test]
    fn test_ffplay_args() {
        let preview = FfplayPreview::new("ffplay", "talk.mp4");
        let args = preview.args(10.0, 12.5);
        assert!(args.contains(&"-autoexit".to_string()));
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "10");
        assert_eq!(args[ss + 3], "2.5");
        assert_eq!(args.last().map(String::as_str), Some("talk.mp4"));
    }
}

//! The editing session aggregate.
//!
//! One `EditingSession` owns everything a front end mutates: the loaded
//! media reference, its timeline, the per-section states and the silence
//! setting. Commands take `&mut self` and either succeed completely or leave
//! the session exactly as it was.

use cutlist_core::{
    CutlistError, EditingConfig, Result, TimeRange, TimecodeCodec, CUT_POINT_EPSILON,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};
use uuid::Uuid;

use crate::marker::{InteractionMode, MarkerIndex};
use crate::plan::{AssemblyPlan, AssemblyPlanner};
use crate::section::{derive_sections, Section, SectionState, SectionStateStore};
use crate::timeline::Timeline;

/// The media item being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Source file, when the media came from disk.
    pub path: Option<PathBuf>,
    /// Duration in seconds.
    pub duration: f64,
}

#[derive(Debug, Clone)]
struct Loaded {
    media: MediaRef,
    timeline: Timeline,
    states: SectionStateStore,
}

/// Editing state for one media item at a time.
#[derive(Debug, Clone)]
pub struct EditingSession {
    id: Uuid,
    config: EditingConfig,
    loaded: Option<Loaded>,
    silence_gap: f64,
}

impl EditingSession {
    /// Create a session with no media loaded.
    pub fn new(config: EditingConfig) -> Self {
        let silence_gap = config.silence_gap;
        Self {
            id: Uuid::new_v4(),
            config,
            loaded: None,
            silence_gap,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &EditingConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn media(&self) -> Option<&MediaRef> {
        self.loaded.as_ref().map(|l| &l.media)
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.loaded.as_ref().map(|l| &l.timeline)
    }

    pub fn section_states(&self) -> Option<&SectionStateStore> {
        self.loaded.as_ref().map(|l| &l.states)
    }

    fn loaded(&self) -> Result<&Loaded> {
        self.loaded.as_ref().ok_or(CutlistError::NoMediaLoaded)
    }

    fn loaded_mut(&mut self) -> Result<&mut Loaded> {
        self.loaded.as_mut().ok_or(CutlistError::NoMediaLoaded)
    }

    // ── Media ───────────────────────────────────────────────────

    /// Load a media item, discarding all previous cut points and states.
    pub fn load_media(&mut self, duration: f64, path: Option<PathBuf>) -> Result<()> {
        let epsilon = if self.config.cut_point_epsilon > 0.0 {
            self.config.cut_point_epsilon
        } else {
            CUT_POINT_EPSILON
        };
        let timeline = Timeline::with_epsilon(duration, epsilon)?;

        info!(
            session = %self.id,
            duration,
            path = ?path,
            "Loaded media"
        );
        self.loaded = Some(Loaded {
            media: MediaRef { path, duration },
            timeline,
            states: SectionStateStore::new(),
        });
        Ok(())
    }

    // ── Cut points ──────────────────────────────────────────────

    /// Add a cut point, returning its index.
    pub fn add_cut_point(&mut self, time: f64) -> Result<usize> {
        let loaded = self.loaded_mut()?;
        let index = loaded.timeline.add_cut_point(time)?;
        loaded.states.split(index);
        debug_assert_eq!(loaded.states.len(), loaded.timeline.section_count());

        info!(time, index, "Marker added at {}", TimecodeCodec::format_precise(time));
        Ok(index)
    }

    /// Parse a timecode and add it as a cut point, returning `(index, time)`.
    pub fn add_cut_point_at_timecode(&mut self, text: &str) -> Result<(usize, f64)> {
        self.loaded()?;
        let time = TimecodeCodec::parse(text)?;
        let index = self.add_cut_point(time)?;
        Ok((index, time))
    }

    /// Remove the cut point at `index`, merging its neighbouring sections.
    pub fn remove_cut_point_at(&mut self, index: usize) -> Result<f64> {
        let loaded = self.loaded_mut()?;
        let time = loaded.timeline.remove_cut_point_at(index)?;
        loaded.states.merge(index);
        debug_assert_eq!(loaded.states.len(), loaded.timeline.section_count());

        info!(time, index, "Removed marker at {}", TimecodeCodec::format_precise(time));
        Ok(time)
    }

    /// Remove the most recently added cut point.
    pub fn undo_last(&mut self) -> Result<f64> {
        let loaded = self.loaded_mut()?;
        let (index, time) = loaded.timeline.undo_last()?;
        loaded.states.merge(index);
        debug_assert_eq!(loaded.states.len(), loaded.timeline.section_count());

        info!(time, index, "Undid marker at {}", TimecodeCodec::format_precise(time));
        Ok(time)
    }

    /// Delete the marker under a pointer on a deletable bar of `width`
    /// pixels. Returns the removed time, or `None` when nothing was hit.
    pub fn remove_marker_at_position(&mut self, x: f32, width: f32) -> Result<Option<f64>> {
        let radius = self.config.marker_hit_radius;
        let hit = self
            .marker_index(width, InteractionMode::Deletable)?
            .hit_test_for_delete(x, radius);
        hit.map(|index| self.remove_cut_point_at(index)).transpose()
    }

    /// Marker view over the current timeline.
    pub fn marker_index(&self, width: f32, mode: InteractionMode) -> Result<MarkerIndex<'_>> {
        Ok(MarkerIndex::new(&self.loaded()?.timeline, width, mode))
    }

    // ── Sections ────────────────────────────────────────────────

    /// Current sections in index order.
    pub fn sections(&self) -> Result<Vec<Section>> {
        let loaded = self.loaded()?;
        Ok(derive_sections(
            loaded.timeline.duration(),
            loaded.timeline.cut_points(),
            &loaded.states,
        ))
    }

    /// Time range of one section, e.g. for previewing it.
    pub fn section_range(&self, index: usize) -> Result<TimeRange> {
        let ranges = self.loaded()?.timeline.section_ranges();
        let len = ranges.len();
        ranges
            .get(index)
            .copied()
            .ok_or(CutlistError::IndexOutOfBounds { index, len })
    }

    /// Flip a section between Keep and Delete, returning its new state.
    pub fn toggle_section(&mut self, index: usize) -> Result<SectionState> {
        let state = self.loaded_mut()?.states.toggle(index)?;
        debug!(index, %state, "Toggled section");
        Ok(state)
    }

    pub fn set_section_state(&mut self, index: usize, state: SectionState) -> Result<()> {
        self.loaded_mut()?.states.set(index, state)?;
        debug!(index, %state, "Set section state");
        Ok(())
    }

    // ── Silence ─────────────────────────────────────────────────

    pub fn silence_gap(&self) -> f64 {
        self.silence_gap
    }

    /// Set the gap between kept sections. Negative values clamp to zero;
    /// non-finite values fall back to the configured default. Returns the
    /// value applied.
    pub fn set_silence_gap(&mut self, seconds: f64) -> f64 {
        self.silence_gap = if seconds.is_finite() {
            seconds.max(0.0)
        } else {
            self.default_silence_gap()
        };
        debug!(silence_gap = self.silence_gap, "Set silence gap");
        self.silence_gap
    }

    /// Set the gap from raw user input. Unparseable text falls back to the
    /// configured default.
    pub fn set_silence_gap_text(&mut self, text: &str) -> f64 {
        match text.trim().parse::<f64>() {
            Ok(seconds) => self.set_silence_gap(seconds),
            Err(_) => {
                let fallback = self.default_silence_gap();
                self.set_silence_gap(fallback)
            }
        }
    }

    fn default_silence_gap(&self) -> f64 {
        if self.config.silence_gap.is_finite() {
            self.config.silence_gap.max(0.0)
        } else {
            cutlist_core::defaults::SILENCE_GAP
        }
    }

    // ── Planning ────────────────────────────────────────────────

    /// Plan the output for the current sections and silence setting.
    pub fn build_plan(&self) -> Result<AssemblyPlan> {
        let loaded = self.loaded()?;
        let sections = self.sections()?;
        let plan = AssemblyPlanner::new(loaded.timeline.epsilon())
            .plan_for_export(&sections, self.silence_gap)?;
        info!(
            session = %self.id,
            steps = plan.len(),
            total = plan.total_duration(),
            "Planned output"
        );
        Ok(plan)
    }
}

impl Default for EditingSession {
    fn default() -> Self {
        Self::new(EditingConfig::default())
    }
}

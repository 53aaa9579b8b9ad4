//! Sections derived from cut points, and their Keep/Delete states.

use cutlist_core::{CutlistError, Result, TimeRange, TimecodeCodec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a section goes into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SectionState {
    #[default]
    Keep,
    Delete,
}

impl SectionState {
    /// The opposite state.
    pub fn toggled(self) -> Self {
        match self {
            Self::Keep => Self::Delete,
            Self::Delete => Self::Keep,
        }
    }

    pub fn is_keep(self) -> bool {
        self == Self::Keep
    }

    /// State of the section formed by merging two neighbours: `Keep` only
    /// when both were kept.
    pub fn merge(left: Self, right: Self) -> Self {
        if left.is_keep() && right.is_keep() {
            Self::Keep
        } else {
            Self::Delete
        }
    }
}

impl fmt::Display for SectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => f.write_str("Keep"),
            Self::Delete => f.write_str("Delete"),
        }
    }
}

/// A contiguous slice of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Ordinal position (0-based)
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub state: SectionState,
}

impl Section {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Human label, e.g. `Section 2: 00:00:10 - 00:00:20`.
    pub fn label(&self) -> String {
        format!(
            "Section {}: {} - {}",
            self.index + 1,
            TimecodeCodec::format_display(self.start),
            TimecodeCodec::format_display(self.end)
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.label(), self.state)
    }
}

// ── Derivation ──────────────────────────────────────────────────

/// Split `[0, duration]` at the sorted `cuts`.
///
/// Always returns `cuts.len() + 1` ranges; with no cuts (or a zero duration)
/// that is a single range covering the whole media.
pub fn derive_ranges(duration: f64, cuts: &[f64]) -> Vec<TimeRange> {
    let mut ranges = Vec::with_capacity(cuts.len() + 1);
    let mut last = 0.0;
    for &cut in cuts.iter().chain(std::iter::once(&duration)) {
        ranges.push(TimeRange::new(last, cut));
        last = cut;
    }
    ranges
}

/// Derive sections with their states.
///
/// `states` must have been kept in sync with `cuts`; a missing entry reads
/// as `Keep`.
pub fn derive_sections(duration: f64, cuts: &[f64], states: &SectionStateStore) -> Vec<Section> {
    derive_ranges(duration, cuts)
        .into_iter()
        .enumerate()
        .map(|(index, range)| Section {
            index,
            start: range.start,
            end: range.end,
            state: states.get(index).unwrap_or_default(),
        })
        .collect()
}

// ── State store ─────────────────────────────────────────────────

/// Per-section Keep/Delete states. Its length always equals the section
/// count of the timeline it shadows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionStateStore {
    states: Vec<SectionState>,
}

impl SectionStateStore {
    /// A store for a timeline with no cut points (one section).
    pub fn new() -> Self {
        Self::with_count(1)
    }

    /// A store of `count` sections, all `Keep`.
    pub fn with_count(count: usize) -> Self {
        Self {
            states: vec![SectionState::Keep; count.max(1)],
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Never true for a store built through the public constructors.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<SectionState> {
        self.states.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = SectionState> + '_ {
        self.states.iter().copied()
    }

    /// Set the state of one section.
    pub fn set(&mut self, index: usize, state: SectionState) -> Result<()> {
        let len = self.states.len();
        let slot = self
            .states
            .get_mut(index)
            .ok_or(CutlistError::IndexOutOfBounds { index, len })?;
        *slot = state;
        Ok(())
    }

    /// Flip one section, returning its new state.
    pub fn toggle(&mut self, index: usize) -> Result<SectionState> {
        let next = self
            .get(index)
            .ok_or(CutlistError::IndexOutOfBounds {
                index,
                len: self.states.len(),
            })?
            .toggled();
        self.states[index] = next;
        Ok(next)
    }

    /// A cut point was inserted at cut index `cut_index`: section
    /// `cut_index` keeps its state as the left half and a new `Keep` section
    /// appears right after it.
    pub(crate) fn split(&mut self, cut_index: usize) {
        let at = (cut_index + 1).min(self.states.len());
        self.states.insert(at, SectionState::Keep);
    }

    /// The cut point at `cut_index` was removed: sections `cut_index` and
    /// `cut_index + 1` collapse into one under [`SectionState::merge`].
    pub(crate) fn merge(&mut self, cut_index: usize) {
        if cut_index + 1 >= self.states.len() {
            return;
        }
        let right = self.states.remove(cut_index + 1);
        let left = self.states[cut_index];
        self.states[cut_index] = SectionState::merge(left, right);
    }
}

impl Default for SectionStateStore {
    fn default() -> Self {
        Self::new()
    }
}

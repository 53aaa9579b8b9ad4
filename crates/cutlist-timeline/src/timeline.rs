//! The sorted set of cut points for one media item.

use cutlist_core::{approx_eq, CutlistError, Result, TimeRange, CUT_POINT_EPSILON};

use crate::marker::{InteractionMode, MarkerIndex};
use crate::section::derive_ranges;

/// Cut points over a media item of fixed duration.
///
/// Invariants: every cut point lies in `[0, duration]`, the sequence is
/// strictly increasing, and neighbours are at least `epsilon` apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    duration: f64,
    cut_points: Vec<f64>,
    /// Insertion order of the cut points still present (most recent last).
    history: Vec<f64>,
    epsilon: f64,
}

impl Timeline {
    /// Create an empty timeline for media of `duration` seconds.
    pub fn new(duration: f64) -> Result<Self> {
        Self::with_epsilon(duration, CUT_POINT_EPSILON)
    }

    /// Create an empty timeline with a custom duplicate tolerance.
    pub fn with_epsilon(duration: f64, epsilon: f64) -> Result<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(CutlistError::OutOfRange {
                value: duration,
                duration,
            });
        }
        Ok(Self {
            duration,
            cut_points: Vec::new(),
            history: Vec::new(),
            epsilon,
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Cut points in ascending order.
    pub fn cut_points(&self) -> &[f64] {
        &self.cut_points
    }

    pub fn len(&self) -> usize {
        self.cut_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cut_points.is_empty()
    }

    /// Always `len() + 1`.
    pub fn section_count(&self) -> usize {
        self.cut_points.len() + 1
    }

    /// Section boundaries as time ranges.
    pub fn section_ranges(&self) -> Vec<TimeRange> {
        derive_ranges(self.duration, &self.cut_points)
    }

    /// Index of the cut point within epsilon of `time`.
    pub fn position_of(&self, time: f64) -> Option<usize> {
        let idx = self.cut_points.partition_point(|&c| c < time);
        [idx.checked_sub(1), Some(idx)]
            .into_iter()
            .flatten()
            .find(|&i| {
                self.cut_points
                    .get(i)
                    .is_some_and(|&c| approx_eq(c, time, self.epsilon))
            })
    }

    /// Insert a cut point, returning its index in the sorted sequence.
    pub fn add_cut_point(&mut self, time: f64) -> Result<usize> {
        if !time.is_finite() || time < 0.0 || time > self.duration {
            return Err(CutlistError::OutOfRange {
                value: time,
                duration: self.duration,
            });
        }
        if self.position_of(time).is_some() {
            return Err(CutlistError::Duplicate { value: time });
        }

        let idx = self.cut_points.partition_point(|&c| c < time);
        self.cut_points.insert(idx, time);
        self.history.push(time);
        Ok(idx)
    }

    /// Remove the cut point at `index`, returning its time.
    pub fn remove_cut_point_at(&mut self, index: usize) -> Result<f64> {
        if index >= self.cut_points.len() {
            return Err(CutlistError::IndexOutOfBounds {
                index,
                len: self.cut_points.len(),
            });
        }
        let removed = self.cut_points.remove(index);
        if let Some(h) = self.history.iter().rposition(|&t| t == removed) {
            self.history.remove(h);
        }
        Ok(removed)
    }

    /// Index of the most recently added cut point still present.
    pub fn last_added_index(&self) -> Option<usize> {
        self.history
            .last()
            .and_then(|&t| self.cut_points.iter().position(|&c| c == t))
    }

    /// Remove the most recently added cut point, returning `(index, time)`.
    pub fn undo_last(&mut self) -> Result<(usize, f64)> {
        let index = self.last_added_index().ok_or(CutlistError::Empty)?;
        let time = self.remove_cut_point_at(index)?;
        Ok((index, time))
    }

    /// Cut point under a pointer at `x` on a bar `width` pixels wide.
    pub fn nearest_marker(&self, x: f32, radius: f32, width: f32) -> Option<usize> {
        MarkerIndex::new(self, width, InteractionMode::ReadOnly).hit_test(x, radius)
    }
}

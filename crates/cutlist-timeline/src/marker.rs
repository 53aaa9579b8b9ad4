//! Marker hit-testing.
//!
//! Markers are cut points projected onto a horizontal bar. The same index
//! serves the editable bar (pointer deletes a marker) and the read-only
//! overview (pointer picks a section to preview); only the interaction mode
//! differs.

use cutlist_core::TimeRange;

use crate::timeline::Timeline;

/// What pointer input on a marker bar is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Markers are displayed and can be queried but never deleted.
    #[default]
    ReadOnly,
    /// Clicking a marker deletes the cut point.
    Deletable,
}

/// Projection of seconds onto pixel columns of a bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub duration: f64,
    pub width: f32,
}

impl Projection {
    pub fn new(duration: f64, width: f32) -> Self {
        Self { duration, width }
    }

    /// Pixel column for `time`, truncated to a whole pixel.
    pub fn x_for(&self, time: f64) -> f32 {
        if self.duration <= 0.0 || self.width <= 0.0 {
            return 0.0;
        }
        ((time / self.duration) * self.width as f64).floor() as f32
    }
}

/// Stateless view over a timeline for pointer queries.
pub struct MarkerIndex<'a> {
    timeline: &'a Timeline,
    projection: Projection,
    mode: InteractionMode,
}

impl<'a> MarkerIndex<'a> {
    pub fn new(timeline: &'a Timeline, width: f32, mode: InteractionMode) -> Self {
        Self {
            timeline,
            projection: Projection::new(timeline.duration(), width),
            mode,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Pixel positions of all markers, in cut-point order.
    pub fn positions(&self) -> Vec<f32> {
        self.timeline
            .cut_points()
            .iter()
            .map(|&c| self.projection.x_for(c))
            .collect()
    }

    /// First marker (ascending index) whose projected position is strictly
    /// closer than `radius` to `x`.
    pub fn hit_test(&self, x: f32, radius: f32) -> Option<usize> {
        self.timeline
            .cut_points()
            .iter()
            .position(|&c| (self.projection.x_for(c) - x).abs() < radius)
    }

    /// Like [`Self::hit_test`], but only on a deletable bar.
    pub fn hit_test_for_delete(&self, x: f32, radius: f32) -> Option<usize> {
        match self.mode {
            InteractionMode::Deletable => self.hit_test(x, radius),
            InteractionMode::ReadOnly => None,
        }
    }

    /// Section under pixel column `x`. `None` outside the bar.
    ///
    /// Uses the same projection as [`Self::positions`], so a click on a
    /// drawn marker selects the section starting there.
    pub fn section_at(&self, x: f32) -> Option<usize> {
        if self.projection.width <= 0.0 || x < 0.0 || x > self.projection.width {
            return None;
        }
        let cuts = self.timeline.cut_points();
        Some(cuts.partition_point(|&c| self.projection.x_for(c) <= x))
    }

    /// Time range of section `index`, for previewing it.
    pub fn section_bounds(&self, index: usize) -> Option<TimeRange> {
        self.timeline.section_ranges().get(index).copied()
    }
}

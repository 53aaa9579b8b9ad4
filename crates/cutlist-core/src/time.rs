//! Time representation for section editing
//!
//! Positions are plain seconds (`f64`). Cut points are compared with an
//! explicit tolerance so that floating-point drift from pointer or playhead
//! conversions never produces near-duplicate markers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Two positions closer than this (in seconds) are the same cut point.
pub const CUT_POINT_EPSILON: f64 = 0.001;

/// Compare two positions within `epsilon` seconds.
#[inline]
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// A half-open time range in seconds. The final section of a timeline is
/// treated as closed at the media duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time (inclusive)
    pub start: f64,
    /// End time
    pub end: f64,
}

impl TimeRange {
    /// Create a time range from start and end times.
    #[inline]
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the range in seconds.
    #[inline]
    pub fn duration(self) -> f64 {
        self.end - self.start
    }

    /// True when the range is shorter than `epsilon`.
    #[inline]
    pub fn is_degenerate(self, epsilon: f64) -> bool {
        self.duration() < epsilon
    }

}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s..{:.3}s", self.start, self.end)
    }
}

//! Human timecode parsing and formatting.
//!
//! Four textual shapes are accepted, tried in priority order:
//!
//! | Shape          | Example        | Meaning                         |
//! |----------------|----------------|---------------------------------|
//! | `H:MM:SS:mmm`  | `1:02:03:004`  | hours, minutes, seconds, millis |
//! | `H:MM:SS`      | `01:02:03`     | hours, minutes, seconds         |
//! | `M:SS:mmm`     | `12:34:567`    | minutes, seconds, millis        |
//! | `M:SS`         | `02:05`        | minutes, seconds                |
//!
//! The leading field is one or two digits; every other field has a fixed
//! width. `12:34:56` and `12:34:567` therefore differ only in the width of the
//! last group and resolve to different shapes.

use crate::error::{CutlistError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output precision for [`TimecodeCodec::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimecodeFormat {
    /// `HH:MM:SS`, truncated to whole seconds. Used for section labels.
    Display,
    /// `HH:MM:SS:mmm`, rounded to the nearest millisecond. Used for marker
    /// listings and anywhere sub-second precision matters.
    Precise,
}

impl fmt::Display for TimecodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Display => f.write_str("HH:MM:SS"),
            Self::Precise => f.write_str("HH:MM:SS:mmm"),
        }
    }
}

// ── Grammar ─────────────────────────────────────────────────────

/// Allowed digit count for one colon-separated field.
#[derive(Debug, Clone, Copy)]
struct Width {
    min: usize,
    max: usize,
}

const LEAD: Width = Width { min: 1, max: 2 };
const TWO: Width = Width { min: 2, max: 2 };
const MILLIS: Width = Width { min: 3, max: 3 };

#[derive(Debug, Clone, Copy)]
enum ShapeKind {
    HoursMinutesSecondsMillis,
    HoursMinutesSeconds,
    MinutesSecondsMillis,
    MinutesSeconds,
}

struct Shape {
    kind: ShapeKind,
    widths: &'static [Width],
}

/// Priority order matters: the first matching shape wins.
const SHAPES: &[Shape] = &[
    Shape {
        kind: ShapeKind::HoursMinutesSecondsMillis,
        widths: &[LEAD, TWO, TWO, MILLIS],
    },
    Shape {
        kind: ShapeKind::HoursMinutesSeconds,
        widths: &[LEAD, TWO, TWO],
    },
    Shape {
        kind: ShapeKind::MinutesSecondsMillis,
        widths: &[LEAD, TWO, MILLIS],
    },
    Shape {
        kind: ShapeKind::MinutesSeconds,
        widths: &[LEAD, TWO],
    },
];

impl Shape {
    /// Parse `fields` against this shape, returning the numeric values.
    fn match_fields(&self, fields: &[&str]) -> Option<Vec<u64>> {
        if fields.len() != self.widths.len() {
            return None;
        }
        fields
            .iter()
            .zip(self.widths)
            .map(|(field, width)| {
                let len = field.len();
                if len < width.min || len > width.max || !field.bytes().all(|b| b.is_ascii_digit())
                {
                    return None;
                }
                field.parse::<u64>().ok()
            })
            .collect()
    }

    /// Total milliseconds for matched values.
    fn to_millis(&self, v: &[u64]) -> u64 {
        match self.kind {
            ShapeKind::HoursMinutesSecondsMillis => {
                ((v[0] * 3600 + v[1] * 60 + v[2]) * 1000) + v[3]
            }
            ShapeKind::HoursMinutesSeconds => (v[0] * 3600 + v[1] * 60 + v[2]) * 1000,
            ShapeKind::MinutesSecondsMillis => ((v[0] * 60 + v[1]) * 1000) + v[2],
            ShapeKind::MinutesSeconds => (v[0] * 60 + v[1]) * 1000,
        }
    }
}

// ── Codec ───────────────────────────────────────────────────────

/// Stateless timecode codec.
pub struct TimecodeCodec;

impl TimecodeCodec {
    /// Parse a timecode into seconds.
    pub fn parse(text: &str) -> Result<f64> {
        let trimmed = text.trim();
        let fields: Vec<&str> = trimmed.split(':').collect();

        SHAPES
            .iter()
            .find_map(|shape| {
                shape
                    .match_fields(&fields)
                    .map(|values| shape.to_millis(&values))
            })
            .map(|millis| millis as f64 / 1000.0)
            .ok_or_else(|| CutlistError::InvalidFormat(text.to_string()))
    }

    /// Render seconds as a timecode. Negative and non-finite inputs render
    /// as zero.
    pub fn format(seconds: f64, format: TimecodeFormat) -> String {
        let seconds = if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            0.0
        };

        match format {
            TimecodeFormat::Display => {
                let total = seconds.floor() as u64;
                let (h, m, s) = split_hms(total);
                format!("{h:02}:{m:02}:{s:02}")
            }
            TimecodeFormat::Precise => {
                let total_ms = (seconds * 1000.0).round() as u64;
                let (h, m, s) = split_hms(total_ms / 1000);
                let ms = total_ms % 1000;
                format!("{h:02}:{m:02}:{s:02}:{ms:03}")
            }
        }
    }

    /// Shorthand for [`TimecodeFormat::Display`].
    pub fn format_display(seconds: f64) -> String {
        Self::format(seconds, TimecodeFormat::Display)
    }

    /// Shorthand for [`TimecodeFormat::Precise`].
    pub fn format_precise(seconds: f64) -> String {
        Self::format(seconds, TimecodeFormat::Precise)
    }
}

fn split_hms(total_seconds: u64) -> (u64, u64, u64) {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    (hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_parse_hours_minutes_seconds() {
        assert_close(TimecodeCodec::parse("01:02:03").unwrap(), 3723.0);
    }

    #[test]
    fn test_parse_minutes_seconds() {
        assert_close(TimecodeCodec::parse("02:05").unwrap(), 125.0);
    }

    #[test]
    fn test_parse_single_digit_hours_with_millis() {
        assert_close(TimecodeCodec::parse("1:02:03:004").unwrap(), 3723.004);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = TimecodeCodec::parse("bad").unwrap_err();
        assert!(matches!(err, CutlistError::InvalidFormat(ref s) if s == "bad"));
    }

    #[test]
    fn test_width_disambiguates_last_group() {
        // three-digit tail → minutes:seconds:millis
        assert_close(TimecodeCodec::parse("12:34:567").unwrap(), 754.567);
        // two-digit tail → hours:minutes:seconds
        assert_close(TimecodeCodec::parse("12:34:56").unwrap(), 45296.0);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_close(TimecodeCodec::parse("  00:10 \n").unwrap(), 10.0);
    }

    #[test]
    fn test_parse_rejects_wrong_widths() {
        for bad in [
            "",
            ":",
            "123:45",
            "1:2",
            "01:02:3",
            "01:02:03:04",
            "01:02:03:0004",
            "12:34:5678",
            "001:02:03",
            "01:02:03:004:005",
            "-1:02",
            "+1:02",
            "1a:02",
            "01:0２",
            "01.5:02",
        ] {
            assert!(
                TimecodeCodec::parse(bad).is_err(),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_fields_are_not_range_checked() {
        assert_close(TimecodeCodec::parse("00:75").unwrap(), 75.0);
    }

    #[test]
    fn test_format_display_truncates() {
        assert_eq!(TimecodeCodec::format_display(3723.999), "01:02:03");
        assert_eq!(TimecodeCodec::format_display(0.0), "00:00:00");
    }

    #[test]
    fn test_format_precise_rounds_to_millis() {
        assert_eq!(TimecodeCodec::format_precise(3723.004), "01:02:03:004");
        assert_eq!(TimecodeCodec::format_precise(59.9996), "00:01:00:000");
        assert_eq!(TimecodeCodec::format_precise(12.5), "00:00:12:500");
    }

    #[test]
    fn test_format_clamps_invalid_input() {
        assert_eq!(TimecodeCodec::format_display(-5.0), "00:00:00");
        assert_eq!(TimecodeCodec::format_precise(f64::NAN), "00:00:00:000");
    }

    proptest! {
        #[test]
        fn prop_precise_round_trip(ms in 0u64..(100 * 3600 * 1000)) {
            let x = ms as f64 / 1000.0;
            let text = TimecodeCodec::format_precise(x);
            let back = TimecodeCodec::parse(&text).unwrap();
            prop_assert!((back - x).abs() < 1e-6, "{} -> {} -> {}", x, text, back);
        }

        #[test]
        fn prop_display_round_trip_whole_seconds(secs in 0u64..(100 * 3600), frac in 0.0f64..0.999) {
            let x = secs as f64 + frac;
            let text = TimecodeCodec::format_display(x);
            let back = TimecodeCodec::parse(&text).unwrap();
            prop_assert_eq!(back, secs as f64);
        }
    }
}

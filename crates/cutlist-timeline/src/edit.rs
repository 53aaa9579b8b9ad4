//! Session commands.
//!
//! Every user-facing mutation is a `SessionCommand` value carrying its own
//! arguments (section and marker indices included), so a front end never
//! has to capture loop state in per-row callbacks: it builds the command
//! with the row's index and dispatches it.

use cutlist_core::{Result, TimecodeCodec};
use std::fmt;
use std::path::PathBuf;

use crate::section::SectionState;
use crate::session::EditingSession;

// ── Commands ────────────────────────────────────────────────────

/// A mutation of an [`EditingSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Load media of known duration, resetting the session.
    LoadMedia {
        duration: f64,
        path: Option<PathBuf>,
    },
    /// Add a cut point at a time in seconds.
    AddCutPoint { time: f64 },
    /// Add a cut point from timecode text.
    AddCutPointAtTimecode { text: String },
    /// Remove the cut point at `index`.
    RemoveCutPointAt { index: usize },
    /// Remove the most recently added cut point.
    UndoLast,
    /// Flip section `index` between Keep and Delete.
    ToggleSection { index: usize },
    /// Force section `index` to a state.
    SetSectionState { index: usize, state: SectionState },
    /// Set the silence gap from raw input.
    SetSilenceGap { text: String },
}

impl SessionCommand {
    /// Short identifier for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadMedia { .. } => "load_media",
            Self::AddCutPoint { .. } => "add_cut_point",
            Self::AddCutPointAtTimecode { .. } => "add_cut_point_at_timecode",
            Self::RemoveCutPointAt { .. } => "remove_cut_point_at",
            Self::UndoLast => "undo_last",
            Self::ToggleSection { .. } => "toggle_section",
            Self::SetSectionState { .. } => "set_section_state",
            Self::SetSilenceGap { .. } => "set_silence_gap",
        }
    }

    /// Apply this command to a session.
    ///
    /// On error the session is unchanged.
    pub fn apply(&self, session: &mut EditingSession) -> Result<CommandOutcome> {
        let outcome = match self {
            Self::LoadMedia { duration, path } => {
                session.load_media(*duration, path.clone())?;
                CommandOutcome::Loaded {
                    duration: *duration,
                }
            }
            Self::AddCutPoint { time } => {
                let index = session.add_cut_point(*time)?;
                CommandOutcome::CutPointAdded { index, time: *time }
            }
            Self::AddCutPointAtTimecode { text } => {
                let (index, time) = session.add_cut_point_at_timecode(text)?;
                CommandOutcome::CutPointAdded { index, time }
            }
            Self::RemoveCutPointAt { index } => {
                let time = session.remove_cut_point_at(*index)?;
                CommandOutcome::CutPointRemoved { time }
            }
            Self::UndoLast => {
                let time = session.undo_last()?;
                CommandOutcome::CutPointRemoved { time }
            }
            Self::ToggleSection { index } => {
                let state = session.toggle_section(*index)?;
                CommandOutcome::SectionState {
                    index: *index,
                    state,
                }
            }
            Self::SetSectionState { index, state } => {
                session.set_section_state(*index, *state)?;
                CommandOutcome::SectionState {
                    index: *index,
                    state: *state,
                }
            }
            Self::SetSilenceGap { text } => CommandOutcome::SilenceGap {
                seconds: session.set_silence_gap_text(text),
            },
        };
        tracing::trace!(command = self.name(), "Applied command");
        Ok(outcome)
    }
}

// ── Outcomes ────────────────────────────────────────────────────

/// What a successful command did, for user-facing feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandOutcome {
    Loaded { duration: f64 },
    CutPointAdded { index: usize, time: f64 },
    CutPointRemoved { time: f64 },
    SectionState { index: usize, state: SectionState },
    SilenceGap { seconds: f64 },
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded { duration } => write!(
                f,
                "Media loaded ({})",
                TimecodeCodec::format_precise(*duration)
            ),
            Self::CutPointAdded { time, .. } => write!(
                f,
                "Marker added at {}",
                TimecodeCodec::format_precise(*time)
            ),
            Self::CutPointRemoved { time } => write!(
                f,
                "Removed marker at {}",
                TimecodeCodec::format_precise(*time)
            ),
            Self::SectionState { index, state } => {
                write!(f, "Section {}: {}", index + 1, state)
            }
            Self::SilenceGap { seconds } => {
                write!(f, "Silence between sections: {seconds}s")
            }
        }
    }
}

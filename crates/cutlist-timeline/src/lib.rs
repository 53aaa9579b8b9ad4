//! Cutlist Timeline - section editing model
//!
//! Implements the editing core:
//! - A sorted, deduplicated set of cut points with LIFO undo
//! - Sections derived from the cut points, each tagged Keep or Delete
//! - Marker hit-testing through a display projection
//! - Assembly plans (kept ranges separated by silence gaps)
//! - The `EditingSession` aggregate and its command dispatch

pub mod edit;
pub mod marker;
pub mod plan;
pub mod section;
pub mod session;
pub mod timeline;

pub use edit::{CommandOutcome, SessionCommand};
pub use marker::{InteractionMode, MarkerIndex, Projection};
pub use plan::{AssemblyPlan, AssemblyPlanner, PlanStep};
pub use section::{derive_ranges, derive_sections, Section, SectionState, SectionStateStore};
pub use session::{EditingSession, MediaRef};
pub use timeline::Timeline;

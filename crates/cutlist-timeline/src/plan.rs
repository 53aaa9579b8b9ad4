//! Assembly planning.
//!
//! An [`AssemblyPlan`] is the only thing the external encoder receives: an
//! ordered list of source ranges to copy and silences to insert between
//! them.

use cutlist_core::{CutlistError, Result, TimeRange, CUT_POINT_EPSILON};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::section::Section;

/// One step of an assembly plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PlanStep {
    /// Copy `[start, end)` from the media source.
    KeepRange { start: f64, end: f64 },
    /// Emit silence.
    SilenceGap { duration: f64 },
}

impl PlanStep {
    /// Output length contributed by this step.
    pub fn duration(&self) -> f64 {
        match self {
            Self::KeepRange { start, end } => end - start,
            Self::SilenceGap { duration } => *duration,
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Self::KeepRange { .. })
    }
}

/// Ordered steps for the encoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyPlan {
    steps: Vec<PlanStep>,
}

impl AssemblyPlan {
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Source ranges in output order.
    pub fn keep_ranges(&self) -> impl Iterator<Item = TimeRange> + '_ {
        self.steps.iter().filter_map(|step| match *step {
            PlanStep::KeepRange { start, end } => Some(TimeRange::new(start, end)),
            PlanStep::SilenceGap { .. } => None,
        })
    }

    pub fn gap_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_keep()).count()
    }

    /// Length of the assembled output: kept ranges plus gaps.
    pub fn total_duration(&self) -> f64 {
        self.steps.iter().map(PlanStep::duration).sum()
    }

    /// Length of source material copied into the output.
    pub fn kept_duration(&self) -> f64 {
        self.keep_ranges().map(TimeRange::duration).sum()
    }

    /// Serialize for an external encoder.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CutlistError::Serialization(format!("Failed to serialize plan: {e}")))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CutlistError::Serialization(format!("Invalid plan: {e}")))
    }
}

/// Sum of all step lengths of `plan`.
pub fn total_duration(plan: &AssemblyPlan) -> f64 {
    plan.total_duration()
}

/// Turns sections into an assembly plan.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyPlanner {
    /// Kept sections shorter than this are skipped.
    epsilon: f64,
}

impl AssemblyPlanner {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Build a plan from sections in index order.
    ///
    /// Consecutive kept ranges are separated by exactly one gap, however many
    /// deleted sections lie between them; no gap leads or trails the plan.
    /// A zero `silence_gap` emits no gap steps. The result may be empty.
    pub fn build_plan(&self, sections: &[Section], silence_gap: f64) -> AssemblyPlan {
        let mut steps = Vec::with_capacity(sections.len() * 2);
        let mut emitted_keep = false;

        for section in sections.iter().filter(|s| s.state.is_keep()) {
            if section.range().is_degenerate(self.epsilon) {
                continue;
            }
            if emitted_keep && silence_gap > 0.0 {
                steps.push(PlanStep::SilenceGap {
                    duration: silence_gap,
                });
            }
            steps.push(PlanStep::KeepRange {
                start: section.start,
                end: section.end,
            });
            emitted_keep = true;
        }

        let plan = AssemblyPlan { steps };
        debug!(
            sections = sections.len(),
            steps = plan.len(),
            total = plan.total_duration(),
            "Built assembly plan"
        );
        plan
    }

    /// Build a plan for handing to a sink; an empty plan is an error.
    pub fn plan_for_export(&self, sections: &[Section], silence_gap: f64) -> Result<AssemblyPlan> {
        let plan = self.build_plan(sections, silence_gap);
        if plan.keep_ranges().next().is_none() {
            return Err(CutlistError::NothingToKeep);
        }
        Ok(plan)
    }
}

impl Default for AssemblyPlanner {
    fn default() -> Self {
        Self::new(CUT_POINT_EPSILON)
    }
}

//! Whole-trace summary of a normalized trace.

use serde::Serialize;
use trunkline_ir::{Geometry, HistoryShape, InvariantCheck, Step, Trace};

use crate::audit::{audit_certificates, UnjustifiedMove};

/// Per-step outcome.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Position in the step list.
    pub index: usize,
    pub step_id: u64,
    pub event: String,
    pub geometry: Option<Geometry>,
    pub checks_passed: usize,
    /// Failing checks, in emission order.
    pub failing: Vec<InvariantCheck>,
    pub unjustified_moves: Vec<UnjustifiedMove>,
}

impl StepReport {
    pub fn from_step(index: usize, step: &Step) -> Self {
        let failing: Vec<InvariantCheck> = step.failing_checks().cloned().collect();
        Self {
            index,
            step_id: step.id,
            event: step.event.clone(),
            geometry: step.geometry_highlight,
            checks_passed: step.checks().len() - failing.len(),
            failing,
            unjustified_moves: audit_certificates(step),
        }
    }

    pub fn passed(&self) -> bool {
        self.failing.is_empty()
    }
}

/// Result of checking a normalized trace.
///
/// `passed` reflects invariant checks only; unjustified moves are advisory.
#[derive(Debug, Clone, Serialize)]
pub struct TraceReport {
    pub title: String,
    pub history_shape: HistoryShape,
    pub passed: bool,
    pub checks_passed: usize,
    pub checks_failed: usize,
    /// Id of the first step carrying a failing check.
    pub first_failing_step: Option<u64>,
    pub steps: Vec<StepReport>,
}

impl TraceReport {
    /// Summarise `trace`. Steps that were never normalized contribute no checks.
    pub fn from_trace(trace: &Trace) -> Self {
        let steps: Vec<StepReport> = trace
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| StepReport::from_step(i, step))
            .collect();
        let checks_passed = steps.iter().map(|s| s.checks_passed).sum();
        let checks_failed = steps.iter().map(|s| s.failing.len()).sum();
        let first_failing_step = steps.iter().find(|s| !s.passed()).map(|s| s.step_id);

        Self {
            title: trace.title.clone(),
            history_shape: trace.shape(),
            passed: checks_failed == 0,
            checks_passed,
            checks_failed,
            first_failing_step,
            steps,
        }
    }

    pub fn unjustified_moves(&self) -> impl Iterator<Item = &UnjustifiedMove> {
        self.steps.iter().flat_map(|s| s.unjustified_moves.iter())
    }

    pub fn failing_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.passed())
    }
}

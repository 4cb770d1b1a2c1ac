//! The invariant battery.
//!
//! Line-shaped histories are checked against the boundary lattice, authority
//! uniqueness and fencing, trunk monotonicity (the coupling law) and commit
//! monotonicity. DAG-shaped histories replace that rule set entirely with
//! CRDT monotonicity and convergence.

mod dag;
mod line;

use indexmap::IndexMap;
use trunkline_ir::{HistoryShape, InvariantCheck, Step};

pub use dag::check_crdt_invariants;
pub use line::check_line_invariants;

/// Evaluate every invariant for `step`, using `prev` for the cross-step laws.
pub fn check_invariants(
    step: &Step,
    prev: Option<&Step>,
    shape: HistoryShape,
) -> Vec<InvariantCheck> {
    match shape {
        HistoryShape::Line => check_line_invariants(step, prev),
        HistoryShape::Dag => check_crdt_invariants(step, prev),
    }
}

/// Check every step against its predecessor, keyed by step id.
pub fn validate_trace(steps: &[Step], shape: HistoryShape) -> IndexMap<u64, Vec<InvariantCheck>> {
    let mut results = IndexMap::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| &steps[p]);
        results.insert(step.id, check_invariants(step, prev, shape));
    }
    results
}

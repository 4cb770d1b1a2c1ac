//! Fill the derived fields of every step that the trace did not supply.
//!
//! Precedence is per field: a value present in the document is kept
//! verbatim; an absent one is derived. The one exception is an explicitly
//! empty `boundaries_moved`, whose treatment is chosen by
//! [`EmptyMovesPolicy`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use trunkline_ir::{BoundaryKey, BoundaryMove, HistoryShape, Step, Trace};

use crate::geometry::classify_geometry;
use crate::invariants::check_invariants;
use crate::moves::derive_boundary_moves;

/// What an explicit, empty `boundaries_moved` list means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyMovesPolicy {
    /// Treat it as absent and derive the moves. Matches reference traces.
    #[default]
    Rederive,
    /// Treat it as "no moves occurred" and keep it.
    Preserve,
}

impl fmt::Display for EmptyMovesPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyMovesPolicy::Rederive => f.write_str("rederive"),
            EmptyMovesPolicy::Preserve => f.write_str("preserve"),
        }
    }
}

impl FromStr for EmptyMovesPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rederive" => Ok(EmptyMovesPolicy::Rederive),
            "preserve" => Ok(EmptyMovesPolicy::Preserve),
            other => Err(format!(
                "unknown empty-moves policy '{other}' (expected rederive or preserve)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub empty_moves: EmptyMovesPolicy,
    /// Derive `invariants_ok` from the resolved checks when it is absent.
    pub fill_invariants_ok: bool,
}

impl NormalizeOptions {
    /// Behaviour of the reference traces: empty move lists are re-derived.
    pub fn reference() -> Self {
        Self {
            empty_moves: EmptyMovesPolicy::Rederive,
            fill_invariants_ok: true,
        }
    }

    /// An explicit empty move list is taken at its word.
    pub fn strict() -> Self {
        Self {
            empty_moves: EmptyMovesPolicy::Preserve,
            fill_invariants_ok: true,
        }
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::reference()
    }
}

/// Resolves derived step fields across a whole trace.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::with_options(NormalizeOptions::default())
    }

    pub fn with_options(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    /// Produce a new trace in which every step carries `boundaries_moved`,
    /// `geometry_highlight` (possibly none) and `invariants_checked`.
    ///
    /// The input is not modified. Each step is resolved against the input's
    /// previous step, so explicit fields on earlier steps never influence
    /// derivation on later ones.
    pub fn normalize(&self, trace: &Trace) -> Trace {
        let shape = trace.shape();
        let mut steps = Vec::with_capacity(trace.steps.len());
        let mut derived_fields = 0usize;

        for (i, step) in trace.steps.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| &trace.steps[p]);
            let (normalized, filled) = self.normalize_step(step, prev, shape);
            derived_fields += filled;
            steps.push(normalized);
        }

        let failing = steps
            .iter()
            .filter(|s| s.failing_checks().next().is_some())
            .count();
        info!(
            title = %trace.title,
            steps = steps.len(),
            derived_fields,
            failing_steps = failing,
            "normalized trace"
        );

        Trace {
            steps,
            ..trace.clone()
        }
    }

    /// Resolve one step against its predecessor, returning the enriched step
    /// and the number of fields that had to be derived.
    pub fn normalize_step(
        &self,
        step: &Step,
        prev: Option<&Step>,
        shape: HistoryShape,
    ) -> (Step, usize) {
        let derived_moves = prev
            .map(|p| derive_boundary_moves(p, step))
            .unwrap_or_default();
        let mut out = step.clone();
        let mut filled = 0;

        match &step.boundaries_moved {
            Some(explicit) if !explicit.is_empty() => {
                if !same_moves(explicit, &derived_moves) {
                    warn!(
                        step = step.id,
                        explicit = explicit.len(),
                        derived = derived_moves.len(),
                        "explicit boundaries_moved disagrees with derived moves"
                    );
                }
            }
            Some(_) if self.options.empty_moves == EmptyMovesPolicy::Preserve => {}
            _ => {
                out.boundaries_moved = Some(derived_moves.clone());
                filled += 1;
            }
        }

        if step.geometry_highlight.is_none() {
            out.geometry_highlight = classify_geometry(step, prev, &derived_moves);
            filled += 1;
        }

        if step.invariants_checked.is_none() {
            out.invariants_checked = Some(check_invariants(step, prev, shape));
            filled += 1;
        }

        if self.options.fill_invariants_ok && step.invariants_ok.is_none() {
            out.invariants_ok = Some(out.checks().iter().all(|c| c.holds));
            filled += 1;
        }

        debug!(
            step = step.id,
            moves = out.moves().len(),
            geometry = ?out.geometry_highlight,
            checks = out.checks().len(),
            filled,
            "normalized step"
        );

        (out, filled)
    }
}

/// Justifying certificates are annotations, so only the motion is compared.
/// Listing order is not significant.
fn same_moves(explicit: &[BoundaryMove], derived: &[BoundaryMove]) -> bool {
    fn motions(moves: &[BoundaryMove]) -> Vec<(&str, BoundaryKey, u64, u64)> {
        let mut keys: Vec<_> = moves
            .iter()
            .map(|m| (m.replica.as_str(), m.boundary, m.from, m.to))
            .collect();
        keys.sort_unstable();
        keys
    }
    explicit.len() == derived.len() && motions(explicit) == motions(derived)
}

/// Normalize with [`NormalizeOptions::default`].
pub fn normalize(trace: &Trace) -> Trace {
    Normalizer::new().normalize(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trunkline_ir::{BoundaryKey, Geometry, InvariantCheck, ReplicaMap, ReplicaState};

    fn step(id: u64, commit: u64) -> Step {
        let mut replica = ReplicaState::new(1);
        replica.commit = commit;
        replica.durable = commit;
        replica.end = commit;
        let mut replicas = ReplicaMap::new();
        replicas.insert("R1".into(), replica);
        Step::new(id, replicas)
    }

    fn trace(steps: Vec<Step>) -> Trace {
        Trace::new("normalizer", steps)
    }

    #[test]
    fn fills_every_derived_field() {
        let out = normalize(&trace(vec![step(0, 0), step(1, 1)]));
        assert!(out.is_normalized());

        assert!(out.steps[0].moves().is_empty());
        assert_eq!(out.steps[0].geometry_highlight, None);

        let moves = out.steps[1].moves();
        assert_eq!(moves.len(), 3);
        assert!(moves.iter().any(|m| m.boundary == BoundaryKey::C));
        assert_eq!(out.steps[1].geometry_highlight, Some(Geometry::Safety));
        assert_eq!(out.steps[1].invariants_ok, Some(true));
    }

    #[test]
    fn explicit_values_win() {
        let mut second = step(1, 1);
        second.geometry_highlight = Some(Geometry::Liveness);
        second.invariants_checked = Some(vec![InvariantCheck::new("Custom", false, "declared")]);
        second.invariants_ok = Some(true);
        let explicit = vec![BoundaryMove::new("R9", BoundaryKey::T, 4, 5)];
        second.boundaries_moved = Some(explicit.clone());

        let out = normalize(&trace(vec![step(0, 0), second]));
        let s = &out.steps[1];
        assert_eq!(s.boundaries_moved.as_ref(), Some(&explicit));
        assert_eq!(s.geometry_highlight, Some(Geometry::Liveness));
        assert_eq!(s.checks().len(), 1);
        assert_eq!(s.invariants_ok, Some(true));
    }

    #[test]
    fn invariants_ok_reflects_failing_checks() {
        let out = normalize(&trace(vec![step(0, 2), step(1, 1)]));
        assert_eq!(out.steps[1].invariants_ok, Some(false));

        let options = NormalizeOptions {
            fill_invariants_ok: false,
            ..NormalizeOptions::reference()
        };
        let out = Normalizer::with_options(options).normalize(&trace(vec![step(0, 2), step(1, 1)]));
        assert_eq!(out.steps[1].invariants_ok, None);
    }

    #[test]
    fn empty_moves_policy_decides_explicit_empty_list() {
        let mut second = step(1, 1);
        second.boundaries_moved = Some(Vec::new());
        let input = trace(vec![step(0, 0), second]);

        let rederived = Normalizer::with_options(NormalizeOptions::reference()).normalize(&input);
        assert_eq!(rederived.steps[1].moves().len(), 3);

        let preserved = Normalizer::with_options(NormalizeOptions::strict()).normalize(&input);
        assert!(preserved.steps[1].moves().is_empty());
        assert_eq!(
            preserved.steps[1].geometry_highlight,
            Some(Geometry::Safety),
            "classification always uses derived moves"
        );
    }

    #[test]
    fn move_comparison_ignores_listing_order() {
        let derived = vec![
            BoundaryMove::new("R1", BoundaryKey::C, 0, 1),
            BoundaryMove::new("R2", BoundaryKey::D, 0, 1),
        ];
        let reordered = vec![derived[1].clone(), derived[0].clone()];
        assert!(same_moves(&reordered, &derived));

        let different = vec![derived[0].clone(), BoundaryMove::new("R2", BoundaryKey::D, 0, 2)];
        assert!(!same_moves(&different, &derived));
        assert!(!same_moves(&derived[..1], &derived));
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let first = normalize(&trace(vec![step(0, 0), step(1, 1), step(2, 1), step(3, 0)]));
        let second = normalize(&first);
        assert_eq!(first, second);
    }

    #[test]
    fn dag_shape_selects_crdt_rules() {
        let mut input = trace(vec![step(0, 0), step(1, 0)]);
        input.history_shape = Some(HistoryShape::Dag);
        let out = normalize(&input);
        assert!(out.steps[1].checks().iter().all(|c| c.family() != "T ≤ C"));
    }

    #[test]
    fn policy_parses_from_flag_value() {
        assert_eq!("preserve".parse::<EmptyMovesPolicy>(), Ok(EmptyMovesPolicy::Preserve));
        assert_eq!(EmptyMovesPolicy::Rederive.to_string(), "rederive");
        assert!("sometimes".parse::<EmptyMovesPolicy>().is_err());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: NormalizeOptions = serde_json::from_str(r#"{"empty_moves":"preserve"}"#).unwrap();
        assert_eq!(options, NormalizeOptions::strict());
    }
}

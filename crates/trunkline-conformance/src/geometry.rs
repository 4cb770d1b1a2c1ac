//! Geometry classification as an ordered, first-match-wins rule table.
//!
//! Ties are broken by position in [`GEOMETRY_RULES`], not by semantic weight.
//! Reordering the table changes classification.

use trunkline_ir::{BoundaryKey, BoundaryMove, CertificateType, Geometry, Step};

/// Inputs a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct GeometryContext<'a> {
    pub step: &'a Step,
    pub prev: Option<&'a Step>,
    /// Moves derived against `prev`, regardless of what the step declares.
    pub moves: &'a [BoundaryMove],
}

impl GeometryContext<'_> {
    fn moved(&self, boundary: BoundaryKey) -> bool {
        self.moves.iter().any(|m| m.boundary == boundary)
    }
}

/// A named classification rule.
#[derive(Clone, Copy)]
pub struct GeometryRule {
    pub name: &'static str,
    pub classify: fn(&GeometryContext<'_>) -> Option<Geometry>,
}

impl GeometryRule {
    pub fn apply(&self, ctx: &GeometryContext<'_>) -> Option<Geometry> {
        (self.classify)(ctx)
    }
}

/// Classification rules in priority order.
pub const GEOMETRY_RULES: &[GeometryRule] = &[
    GeometryRule {
        name: "declared-violation",
        classify: declared_violation,
    },
    GeometryRule {
        name: "control-plane",
        classify: control_plane,
    },
    GeometryRule {
        name: "composition-certificate",
        classify: composition_certificate,
    },
    GeometryRule {
        name: "commit-moved",
        classify: commit_moved,
    },
    GeometryRule {
        name: "epoch-changed",
        classify: epoch_changed,
    },
    GeometryRule {
        name: "crash-or-recovery",
        classify: crash_or_recovery,
    },
    GeometryRule {
        name: "trim-moved",
        classify: trim_moved,
    },
    GeometryRule {
        name: "observations",
        classify: observations,
    },
];

fn declared_violation(ctx: &GeometryContext<'_>) -> Option<Geometry> {
    let violation = ctx.step.violation.as_ref()?;
    Some(violation.kind.parse().unwrap_or(Geometry::Coupling))
}

fn control_plane(ctx: &GeometryContext<'_>) -> Option<Geometry> {
    let plane = ctx.step.control_plane.as_ref()?;
    if plane.publishes_shard_map() {
        Some(Geometry::Ownership)
    } else {
        Some(Geometry::Membership)
    }
}

fn composition_certificate(ctx: &GeometryContext<'_>) -> Option<Geometry> {
    ctx.step
        .certificates
        .iter()
        .any(|c| {
            matches!(
                c.kind,
                CertificateType::Externalization | CertificateType::Transaction
            )
        })
        .then_some(Geometry::Composition)
}

fn commit_moved(ctx: &GeometryContext<'_>) -> Option<Geometry> {
    ctx.moved(BoundaryKey::C).then_some(Geometry::Safety)
}

fn epoch_changed(ctx: &GeometryContext<'_>) -> Option<Geometry> {
    let prev = ctx.prev?;
    ctx.step
        .replicas
        .iter()
        .any(|(rid, state)| {
            prev.replicas
                .get(rid)
                .is_some_and(|before| before.epoch != state.epoch)
        })
        .then_some(Geometry::Authority)
}

fn crash_or_recovery(ctx: &GeometryContext<'_>) -> Option<Geometry> {
    ctx.step
        .replicas
        .values()
        .any(|state| state.crashed || state.recovered)
        .then_some(Geometry::Failure)
}

fn trim_moved(ctx: &GeometryContext<'_>) -> Option<Geometry> {
    ctx.moved(BoundaryKey::T).then_some(Geometry::Resource)
}

fn observations(ctx: &GeometryContext<'_>) -> Option<Geometry> {
    ctx.step.has_observations().then_some(Geometry::Observation)
}

/// The first rule in [`GEOMETRY_RULES`] that fires, with its label.
pub fn matching_rule(ctx: &GeometryContext<'_>) -> Option<(&'static GeometryRule, Geometry)> {
    GEOMETRY_RULES
        .iter()
        .find_map(|rule| rule.apply(ctx).map(|g| (rule, g)))
}

/// Assign `step` a single geometry label, or none.
pub fn classify_geometry(
    step: &Step,
    prev: Option<&Step>,
    moves: &[BoundaryMove],
) -> Option<Geometry> {
    let ctx = GeometryContext { step, prev, moves };
    matching_rule(&ctx).map(|(_, geometry)| geometry)
}

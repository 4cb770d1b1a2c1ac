//! Certificate audit: every forward C or T move should be traceable to a
//! commit or trim certificate issued in the same step.
//!
//! The audit is advisory. It reads resolved moves and never feeds back into
//! `invariants_checked`.

use serde::Serialize;
use trunkline_ir::{BoundaryKey, BoundaryMove, CertificateType, Step, Trace};

/// A boundary advance with no certificate behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnjustifiedMove {
    pub step_id: u64,
    pub replica: String,
    pub boundary: BoundaryKey,
    pub from: u64,
    pub to: u64,
    /// Certificate type that would have justified the move.
    pub required: CertificateType,
}

fn is_justified(step: &Step, mv: &BoundaryMove) -> bool {
    mv.justified_by
        .as_ref()
        .is_some_and(|cert| cert.backs(mv.boundary))
        || step.certificates.iter().any(|cert| cert.backs(mv.boundary))
}

/// Forward C/T moves in `step` that no certificate backs.
pub fn audit_certificates(step: &Step) -> Vec<UnjustifiedMove> {
    step.moves()
        .iter()
        .filter(|mv| mv.to > mv.from)
        .filter_map(|mv| {
            let required = CertificateType::justifying(mv.boundary)?;
            (!is_justified(step, mv)).then(|| UnjustifiedMove {
                step_id: step.id,
                replica: mv.replica.clone(),
                boundary: mv.boundary,
                from: mv.from,
                to: mv.to,
                required,
            })
        })
        .collect()
}

/// [`audit_certificates`] over every step, in step order.
pub fn audit_trace(trace: &Trace) -> Vec<UnjustifiedMove> {
    trace.steps.iter().flat_map(audit_certificates).collect()
}

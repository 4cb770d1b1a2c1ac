//! Invariant reports and the catalogue of invariant families.

use serde::{Deserialize, Serialize};

/// Outcome of evaluating one invariant on one step.
///
/// A failing check is data, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantCheck {
    /// Invariant name, with the replica or epoch it concerns embedded,
    /// e.g. `T ≤ C (R1)`.
    pub invariant: String,
    pub holds: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl InvariantCheck {
    pub fn new(invariant: impl Into<String>, holds: bool, detail: impl Into<String>) -> Self {
        Self {
            invariant: invariant.into(),
            holds,
            detail: Some(detail.into()),
        }
    }

    /// The invariant name without its parenthesised subject.
    pub fn family(&self) -> &str {
        match self.invariant.find(" (") {
            Some(pos) => &self.invariant[..pos],
            None => &self.invariant,
        }
    }

    pub fn detail(&self) -> &str {
        self.detail.as_deref().unwrap_or("")
    }
}

/// Every invariant family the checker can emit, with a short statement of
/// the law it enforces.
pub const INVARIANT_FAMILIES: [(&str, &str); 13] = [
    ("T ≤ C", "only committed entries may be trimmed"),
    ("D ≤ E", "only entries present in the log may be made durable"),
    ("A ≤ E", "only entries present in the log may be applied"),
    ("A ≤ C", "only committed entries are applied; applying wet cement exposes phantom state"),
    ("D ≥ C", "committed entries must be durable on every replica that claims them"),
    ("Authority uniqueness", "at most one valid leader per (configEpoch, leaderEpoch)"),
    ("Authority fencing", "old leaders must be fenced once a higher epoch exists"),
    ("Trunk monotone", "committed entries are monotone in (epoch, index)"),
    ("C monotone", "the commit frontier never retreats"),
    ("Set monotone", "grow-only set elements are never removed"),
    ("Events monotone", "the event log only grows"),
    ("VC monotone", "vector clock entries never decrease"),
    ("Convergence", "all non-partitioned replicas hold the same state"),
];

pub fn invariant_description(family: &str) -> Option<&'static str> {
    INVARIANT_FAMILIES
        .iter()
        .find(|(name, _)| *name == family)
        .map(|(_, desc)| *desc)
}

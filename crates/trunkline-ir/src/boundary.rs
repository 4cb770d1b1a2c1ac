//! The five per-replica frontiers of the boundary lattice and the moves
//! derived between consecutive steps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;

/// One of the five boundary counters tracked per replica.
///
/// Conceptually `T ≤ D, A ≤ E`, with `A ≤ C` and `T ≤ C`. `C` is not bound by
/// a simple chain with `D`/`A`: it only advances on a commit certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BoundaryKey {
    /// Trim: history before this point is gone.
    T,
    /// Durable: persisted to stable storage.
    D,
    /// Applied: applied to the state machine.
    A,
    /// Commit: on the committed trunk.
    C,
    /// End: last appended entry.
    E,
}

impl BoundaryKey {
    /// All boundaries in lattice order.
    pub const ALL: [BoundaryKey; 5] = [
        BoundaryKey::T,
        BoundaryKey::D,
        BoundaryKey::A,
        BoundaryKey::C,
        BoundaryKey::E,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryKey::T => "T",
            BoundaryKey::D => "D",
            BoundaryKey::A => "A",
            BoundaryKey::C => "C",
            BoundaryKey::E => "E",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BoundaryKey::T => "Trim",
            BoundaryKey::D => "Durable",
            BoundaryKey::A => "Applied",
            BoundaryKey::C => "Commit",
            BoundaryKey::E => "End",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BoundaryKey::T => "entries before T are permanently discarded; T may only cover committed entries",
            BoundaryKey::D => "entries up to D are fsynced to stable storage",
            BoundaryKey::A => "entries up to A have been applied to the state machine",
            BoundaryKey::C => "entries up to C are on the committed trunk and never retreat",
            BoundaryKey::E => "the last appended entry; entries in (C, E] are wet cement",
        }
    }
}

impl fmt::Display for BoundaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundaryKey {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "T" => Ok(BoundaryKey::T),
            "D" => Ok(BoundaryKey::D),
            "A" => Ok(BoundaryKey::A),
            "C" => Ok(BoundaryKey::C),
            "E" => Ok(BoundaryKey::E),
            other => Err(format!("unknown boundary '{other}'")),
        }
    }
}

/// A change of one boundary counter on one replica between adjacent steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryMove {
    /// Replica whose counter moved.
    pub replica: String,
    /// Which boundary moved.
    pub boundary: BoundaryKey,
    /// Value in the previous step.
    pub from: u64,
    /// Value in the current step.
    pub to: u64,
    /// Certificate the trace author cites as justification, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justified_by: Option<Certificate>,
}

impl BoundaryMove {
    pub fn new(replica: impl Into<String>, boundary: BoundaryKey, from: u64, to: u64) -> Self {
        Self {
            replica: replica.into(),
            boundary,
            from,
            to,
            justified_by: None,
        }
    }

    /// Whether the counter moved backwards.
    pub fn is_retreat(&self) -> bool {
        self.to < self.from
    }
}

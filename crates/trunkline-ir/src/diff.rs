//! Structured delta between two adjacent steps.

use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryKey;
use crate::certificate::Certificate;
use crate::replica::{LogEntry, ReplicaFlag, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryChange {
    pub replica: String,
    pub boundary: BoundaryKey,
    pub old: u64,
    pub new: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryChange {
    pub replica: String,
    pub entry: LogEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochChange {
    pub replica: String,
    pub old: u64,
    pub new: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChange {
    pub replica: String,
    pub old: Role,
    pub new: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagChange {
    pub replica: String,
    pub flag: ReplicaFlag,
    pub old: bool,
    pub new: bool,
}

/// What changed from one step to the next, for change highlighting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepDiff {
    pub boundaries_changed: Vec<BoundaryChange>,
    pub entries_added: Vec<EntryChange>,
    pub entries_removed: Vec<EntryChange>,
    pub epoch_changed: Vec<EpochChange>,
    pub role_changed: Vec<RoleChange>,
    pub flags_changed: Vec<FlagChange>,
    /// Every certificate carried by the current step.
    pub certs_issued: Vec<Certificate>,
    pub violation_appeared: bool,
    pub violation_resolved: bool,
}

impl StepDiff {
    /// True when no replica-level change was recorded.
    pub fn is_quiet(&self) -> bool {
        self.boundaries_changed.is_empty()
            && self.entries_added.is_empty()
            && self.entries_removed.is_empty()
            && self.epoch_changed.is_empty()
            && self.role_changed.is_empty()
            && self.flags_changed.is_empty()
    }
}

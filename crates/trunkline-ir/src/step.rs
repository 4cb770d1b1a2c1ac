//! One frame of the storyboard, and the records a step may carry.

use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryMove;
use crate::certificate::Certificate;
use crate::geometry::Geometry;
use crate::invariant::InvariantCheck;
use crate::replica::{LogEntry, ReplicaMap};

/// A protocol message observed during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
    /// `request`, `replication`, `ack`, `election`, ... (open set).
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u64>,
    /// `Some(false)` means in flight or dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObservationType {
    ClientWrite,
    ClientRead,
    TxnCommit,
    ExternalEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservedConsistency {
    Linearizable,
    Sequential,
    Causal,
    Eventual,
    BoundedStale,
}

/// A client-visible effect recorded during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "type")]
    pub kind: ObservationType,
    pub actor: String,
    #[serde(
        rename = "targetReplica",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_replica: Option<String>,
    /// Idempotency key or transaction id.
    #[serde(rename = "opId", default, skip_serializing_if = "Option::is_none")]
    pub op_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency: Option<ObservedConsistency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Catalogue of bug classes a violation can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BugClass {
    PhantomCommit,
    SplitBrain,
    ResurrectedHistory,
    ZombieSideEffect,
    ReadAnomaly,
    DataLossAfterAck,
    TrimCliff,
    ReconfigSplitBrain,
    ElectionStorm,
}

/// A violation the trace author declares for a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Usually a geometry name; free text otherwise.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub law: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub framework_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bug_class: Option<BugClass>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    Active,
    Pruned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBranch {
    pub branch_id: String,
    pub epoch: u64,
    pub entries: Vec<LogEntry>,
    pub status: BranchStatus,
}

/// Committed trunk plus the speculative branches hanging off it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTree {
    pub committed_trunk: Vec<LogEntry>,
    #[serde(default)]
    pub branches: Vec<HistoryBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipConfig {
    pub epoch: u64,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardOwnership {
    pub shard: String,
    #[serde(rename = "configEpoch")]
    pub config_epoch: u64,
    pub replicas: Vec<String>,
}

/// Membership and shard-placement state published by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlPlane {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configs: Option<Vec<MembershipConfig>>,
    #[serde(
        rename = "currentConfigEpoch",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_config_epoch: Option<u64>,
    #[serde(rename = "shardMap", default, skip_serializing_if = "Option::is_none")]
    pub shard_map: Option<Vec<ShardOwnership>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ControlPlane {
    pub fn publishes_shard_map(&self) -> bool {
        self.shard_map.as_ref().is_some_and(|map| !map.is_empty())
    }
}

/// One frame of a trace.
///
/// The last four fields are derived. `None` means the document did not
/// supply them; the normalizer fills exactly those gaps and leaves supplied
/// values untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: u64,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub narration: String,

    pub replicas: ReplicaMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_tree: Option<HistoryTree>,
    #[serde(
        rename = "controlPlane",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub control_plane: Option<ControlPlane>,

    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<Vec<Observation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundaries_moved: Option<Vec<BoundaryMove>>,
    #[serde(default)]
    pub geometry_highlight: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invariants_checked: Option<Vec<InvariantCheck>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invariants_ok: Option<bool>,
}

impl Step {
    pub fn new(id: u64, replicas: ReplicaMap) -> Self {
        Self {
            id,
            event: String::new(),
            narration: String::new(),
            replicas,
            history_tree: None,
            control_plane: None,
            messages: Vec::new(),
            certificates: Vec::new(),
            observations: None,
            violation: None,
            boundaries_moved: None,
            geometry_highlight: None,
            invariants_checked: None,
            invariants_ok: None,
        }
    }

    pub fn has_observations(&self) -> bool {
        self.observations.as_ref().is_some_and(|obs| !obs.is_empty())
    }

    /// Resolved boundary moves, empty until normalized.
    pub fn moves(&self) -> &[BoundaryMove] {
        self.boundaries_moved.as_deref().unwrap_or(&[])
    }

    /// Resolved invariant checks, empty until normalized.
    pub fn checks(&self) -> &[InvariantCheck] {
        self.invariants_checked.as_deref().unwrap_or(&[])
    }

    pub fn failing_checks(&self) -> impl Iterator<Item = &InvariantCheck> {
        self.checks().iter().filter(|check| !check.holds)
    }

    /// Whether every derived field the output contract requires is present.
    pub fn is_normalized(&self) -> bool {
        self.boundaries_moved.is_some() && self.invariants_checked.is_some()
    }
}

//! Per-replica state: the boundary lattice, the log and status flags.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryKey;
use crate::crdt::CrdtState;
use crate::is_false;

/// Replicas of a step keyed by replica id, in document order.
pub type ReplicaMap = IndexMap<String, ReplicaState>;

/// Full address of a log entry in the history space.
///
/// The derived ordering is lexicographic over
/// `(shard, config_epoch, leader_epoch, index)`; committed entries must be
/// monotone under it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<String>,
    #[serde(
        rename = "configEpoch",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub config_epoch: Option<u64>,
    #[serde(rename = "leaderEpoch")]
    pub leader_epoch: u64,
    pub index: u64,
}

/// An entry in a replica's log.
///
/// Entries are unique by `(index, epoch)`, not by index alone: a higher-epoch
/// leader may overwrite an index during branch truncation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "idx", alias = "index")]
    pub index: u64,
    #[serde(rename = "val", alias = "value")]
    pub value: String,
    /// Leader epoch the entry was appended in.
    #[serde(alias = "leaderEpoch")]
    pub epoch: u64,
    #[serde(
        rename = "configEpoch",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub config_epoch: Option<u64>,
    #[serde(
        alias = "originLeader",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_leader: Option<String>,
}

impl LogEntry {
    pub fn new(index: u64, value: impl Into<String>, epoch: u64) -> Self {
        Self {
            index,
            value: value.into(),
            epoch,
            config_epoch: None,
            origin_leader: None,
        }
    }

    pub fn coordinate(&self, shard: Option<&str>) -> Coordinate {
        Coordinate {
            shard: shard.map(str::to_owned),
            config_epoch: self.config_epoch,
            leader_epoch: self.epoch,
            index: self.index,
        }
    }
}

/// Leader or follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Follower,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Leader => f.write_str("leader"),
            Role::Follower => f.write_str("follower"),
        }
    }
}

/// Status flags whose transitions the step diff reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaFlag {
    Crashed,
    Recovered,
    Partitioned,
    Danger,
}

impl ReplicaFlag {
    pub const ALL: [ReplicaFlag; 4] = [
        ReplicaFlag::Crashed,
        ReplicaFlag::Recovered,
        ReplicaFlag::Partitioned,
        ReplicaFlag::Danger,
    ];
}

impl fmt::Display for ReplicaFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplicaFlag::Crashed => "crashed",
            ReplicaFlag::Recovered => "recovered",
            ReplicaFlag::Partitioned => "partitioned",
            ReplicaFlag::Danger => "danger",
        };
        f.write_str(name)
    }
}

/// State of one replica in one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<String>,
    /// Membership configuration version.
    #[serde(
        rename = "configEpoch",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub config_epoch: Option<u64>,
    /// Current leader epoch (term/view).
    pub epoch: u64,

    #[serde(default, skip_serializing_if = "is_false")]
    pub leader: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub crashed: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub recovered: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub partitioned: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub danger: bool,

    #[serde(rename = "T")]
    pub trim: u64,
    #[serde(rename = "D")]
    pub durable: u64,
    #[serde(rename = "A")]
    pub applied: u64,
    #[serde(rename = "C")]
    pub commit: u64,
    #[serde(rename = "E")]
    pub end: u64,

    /// Line-shaped history.
    pub log: Vec<LogEntry>,
    /// DAG/CRDT history.
    #[serde(rename = "crdtState", default, skip_serializing_if = "Option::is_none")]
    pub crdt_state: Option<CrdtState>,
}

impl ReplicaState {
    /// A follower at epoch `epoch` with every boundary at zero and an empty log.
    pub fn new(epoch: u64) -> Self {
        Self {
            shard: None,
            config_epoch: None,
            epoch,
            leader: false,
            crashed: false,
            recovered: false,
            partitioned: false,
            danger: false,
            trim: 0,
            durable: 0,
            applied: 0,
            commit: 0,
            end: 0,
            log: Vec::new(),
            crdt_state: None,
        }
    }

    pub fn boundary(&self, key: BoundaryKey) -> u64 {
        match key {
            BoundaryKey::T => self.trim,
            BoundaryKey::D => self.durable,
            BoundaryKey::A => self.applied,
            BoundaryKey::C => self.commit,
            BoundaryKey::E => self.end,
        }
    }

    pub fn set_boundary(&mut self, key: BoundaryKey, value: u64) {
        match key {
            BoundaryKey::T => self.trim = value,
            BoundaryKey::D => self.durable = value,
            BoundaryKey::A => self.applied = value,
            BoundaryKey::C => self.commit = value,
            BoundaryKey::E => self.end = value,
        }
    }

    pub fn flag(&self, flag: ReplicaFlag) -> bool {
        match flag {
            ReplicaFlag::Crashed => self.crashed,
            ReplicaFlag::Recovered => self.recovered,
            ReplicaFlag::Partitioned => self.partitioned,
            ReplicaFlag::Danger => self.danger,
        }
    }

    pub fn role(&self) -> Role {
        if self.leader {
            Role::Leader
        } else {
            Role::Follower
        }
    }

    /// Config epoch, defaulting to 0 when the trace does not track membership.
    pub fn config_epoch_or_default(&self) -> u64 {
        self.config_epoch.unwrap_or(0)
    }

    /// Entries at or below the commit frontier.
    pub fn committed_slice(&self) -> impl Iterator<Item = &LogEntry> {
        let commit = self.commit;
        self.log.iter().filter(move |entry| entry.index <= commit)
    }
}

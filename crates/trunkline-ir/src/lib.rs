#![doc = include_str!("../README.md")]

//! Trunkline trace model.
//!
//! This crate defines the data model of a recorded consensus execution: the
//! trace and its steps, per-replica boundary lattices and logs, certificates,
//! derived boundary moves and invariant reports, typed CRDT state and the
//! step-diff record produced for change-highlighting consumers.

pub mod boundary;
pub mod certificate;
pub mod crdt;
pub mod diff;
pub mod geometry;
pub mod invariant;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod replica;
pub mod step;
pub mod trace;

pub use boundary::{BoundaryKey, BoundaryMove};
pub use certificate::{Certificate, CertificateEvidence, CertificateType};
pub use crdt::{CrdtKind, CrdtState, VectorClock};
pub use diff::StepDiff;
pub use geometry::Geometry;
pub use invariant::InvariantCheck;
pub use replica::{Coordinate, LogEntry, ReplicaFlag, ReplicaMap, ReplicaState, Role};
pub use step::Step;
pub use trace::{HistoryShape, Trace};

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

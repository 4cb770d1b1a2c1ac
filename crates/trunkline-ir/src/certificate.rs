//! Certificates: the proofs that justify boundary movements.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryKey;

/// Kind of proof a certificate carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateType {
    Authority,
    Commit,
    Read,
    Trim,
    Externalization,
    Transaction,
}

impl CertificateType {
    pub const ALL: [CertificateType; 6] = [
        CertificateType::Authority,
        CertificateType::Commit,
        CertificateType::Read,
        CertificateType::Trim,
        CertificateType::Externalization,
        CertificateType::Transaction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateType::Authority => "authority",
            CertificateType::Commit => "commit",
            CertificateType::Read => "read",
            CertificateType::Trim => "trim",
            CertificateType::Externalization => "externalization",
            CertificateType::Transaction => "transaction",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CertificateType::Authority => {
                "a replica won an election and holds the right to write in this epoch"
            }
            CertificateType::Commit => {
                "a quorum acknowledged an entry, so it joins the committed trunk and C advances"
            }
            CertificateType::Read => "a read observed state at least as fresh as C",
            CertificateType::Trim => {
                "every replica confirmed entries below T are durable, so they may be discarded"
            }
            CertificateType::Externalization => {
                "an external side effect was sent under an idempotency key"
            }
            CertificateType::Transaction => {
                "all shards of a cross-shard transaction agreed to commit"
            }
        }
    }

    /// The certificate type that justifies moving `boundary`, if the
    /// certificate principle names one.
    pub fn justifying(boundary: BoundaryKey) -> Option<CertificateType> {
        match boundary {
            BoundaryKey::C => Some(CertificateType::Commit),
            BoundaryKey::T => Some(CertificateType::Trim),
            BoundaryKey::D | BoundaryKey::A | BoundaryKey::E => None,
        }
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence attached to a certificate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateEvidence {
    /// Replicas that contributed to the proof.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quorum: Option<Vec<String>>,
    /// Boundary this evidence justifies moving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
    #[serde(
        rename = "configEpoch",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub config_epoch: Option<u64>,
}

/// A certificate issued during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "type")]
    pub kind: CertificateType,
    /// Replica (or client) holding the proof.
    pub holder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<String>,
    #[serde(default)]
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<CertificateEvidence>,
    /// `Some(false)` marks a certificate the trace itself declares invalid
    /// (for example an insufficient quorum).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

impl Certificate {
    pub fn new(kind: CertificateType, holder: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            holder: holder.into(),
            epoch: None,
            shard: None,
            detail: detail.into(),
            evidence: None,
            valid: None,
        }
    }

    pub fn is_declared_invalid(&self) -> bool {
        self.valid == Some(false)
    }

    /// Whether this certificate can stand behind a move of `boundary`.
    pub fn backs(&self, boundary: BoundaryKey) -> bool {
        if CertificateType::justifying(boundary) != Some(self.kind) || self.is_declared_invalid() {
            return false;
        }
        match self.evidence.as_ref().and_then(|e| e.boundary) {
            Some(named) => named == boundary,
            None => true,
        }
    }
}

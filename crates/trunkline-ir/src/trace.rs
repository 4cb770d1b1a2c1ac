//! The top-level trace document.

use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;
use crate::step::Step;

/// Whether replicas hold a totally ordered log or CRDT state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryShape {
    #[default]
    Line,
    Dag,
}

impl HistoryShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryShape::Line => "line",
            HistoryShape::Dag => "dag",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyModel {
    Linearizable,
    Sequential,
    Causal,
    Eventual,
}

/// The abstract object being implemented.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// e.g. "Linearizable Register", "Causal Store".
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invariant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_model: Option<ConsistencyModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invariants: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<Vec<String>>,
}

/// What the execution assumes about faults, storage, network and timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub fault_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_model: Option<String>,
}

/// A recorded execution: an ordered list of steps plus the object and
/// environment it was recorded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_refs: Option<Vec<String>>,

    pub spec: ObjectSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(
        rename = "consistencyModel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub consistency_model: Option<ConsistencyModel>,
    #[serde(rename = "failureModel", default)]
    pub failure_model: String,
    #[serde(
        rename = "historyShape",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub history_shape: Option<HistoryShape>,
    #[serde(
        rename = "livenessAssumptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub liveness_assumptions: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometries: Option<Vec<Geometry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shards: Option<Vec<String>>,
    #[serde(
        rename = "hasControlPlane",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub has_control_plane: Option<bool>,

    pub steps: Vec<Step>,
}

impl Trace {
    pub fn new(title: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            framework_refs: None,
            spec: ObjectSpec::default(),
            environment: None,
            consistency_model: None,
            failure_model: String::new(),
            history_shape: None,
            liveness_assumptions: None,
            geometries: None,
            shards: None,
            has_control_plane: None,
            steps,
        }
    }

    /// Declared history shape; line unless the trace says otherwise.
    pub fn shape(&self) -> HistoryShape {
        self.history_shape.unwrap_or_default()
    }

    pub fn is_normalized(&self) -> bool {
        self.steps.iter().all(Step::is_normalized)
    }
}

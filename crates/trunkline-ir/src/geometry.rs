use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The correctness dimension a step exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    Safety,
    Authority,
    Coupling,
    Resource,
    Observation,
    Ownership,
    Membership,
    Causality,
    Composition,
    Failure,
    Liveness,
}

impl Geometry {
    pub const ALL: [Geometry; 11] = [
        Geometry::Safety,
        Geometry::Authority,
        Geometry::Coupling,
        Geometry::Resource,
        Geometry::Observation,
        Geometry::Ownership,
        Geometry::Membership,
        Geometry::Causality,
        Geometry::Composition,
        Geometry::Failure,
        Geometry::Liveness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Geometry::Safety => "safety",
            Geometry::Authority => "authority",
            Geometry::Coupling => "coupling",
            Geometry::Resource => "resource",
            Geometry::Observation => "observation",
            Geometry::Ownership => "ownership",
            Geometry::Membership => "membership",
            Geometry::Causality => "causality",
            Geometry::Composition => "composition",
            Geometry::Failure => "failure",
            Geometry::Liveness => "liveness",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Geometry::Safety => "quorum intersection: who must confirm",
            Geometry::Authority => "epoch fencing: who may write",
            Geometry::Coupling => "sets and epochs together: why both matter",
            Geometry::Resource => "retention and trim: what history is kept",
            Geometry::Observation => "read/write contracts: what clients see",
            Geometry::Ownership => "sharding: who owns which keyspace",
            Geometry::Membership => "config epochs: who is in the group",
            Geometry::Causality => "partial order: DAG histories and CALM",
            Geometry::Composition => "transactions and externalization",
            Geometry::Failure => "fault model: what can break",
            Geometry::Liveness => "progress: will certificates keep forming",
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Geometry {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Geometry::ALL
            .into_iter()
            .find(|g| g.as_str() == raw)
            .ok_or_else(|| format!("unknown geometry '{raw}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matches_serde_names() {
        for geometry in Geometry::ALL {
            let json = serde_json::to_value(geometry).unwrap();
            assert_eq!(json, geometry.as_str());
            assert_eq!(geometry.as_str().parse::<Geometry>(), Ok(geometry));
        }
        assert!("split_brain".parse::<Geometry>().is_err());
    }
}

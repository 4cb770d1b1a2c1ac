//! Typed CRDT state for DAG-shaped histories.
//!
//! Documents may carry an explicit `"kind"` discriminant. Documents without
//! one are classified exactly once, while decoding, from the fields they
//! carry; nothing downstream inspects raw shapes.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Per-node logical clock, keyed by node id in document order.
pub type VectorClock = IndexMap<String, u64>;

/// Replicated-object state of one replica in a DAG-shaped trace.
#[derive(Debug, Clone, PartialEq)]
pub struct CrdtState {
    pub kind: CrdtKind,
    pub vector_clock: Option<VectorClock>,
}

/// The shape of a CRDT payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CrdtKind {
    /// Grow-only (or two-phase) set.
    GSet {
        add_set: Vec<String>,
        remove_set: Vec<String>,
    },
    /// Per-node counters.
    Counter { counts: IndexMap<String, i64> },
    /// Append-only event log.
    EventLog { events: Vec<String> },
    /// Anything else, kept verbatim.
    Opaque(Map<String, Value>),
}

impl CrdtKind {
    pub fn tag(&self) -> &'static str {
        match self {
            CrdtKind::GSet { .. } => "gset",
            CrdtKind::Counter { .. } => "counter",
            CrdtKind::EventLog { .. } => "event_log",
            CrdtKind::Opaque(_) => "opaque",
        }
    }

    fn from_tagged(tag: &str, mut fields: Map<String, Value>) -> Result<Self, String> {
        match tag {
            "gset" => Ok(CrdtKind::GSet {
                add_set: optional_elements(&mut fields, "addSet")?,
                remove_set: optional_elements(&mut fields, "removeSet")?,
            }),
            "counter" => Ok(CrdtKind::Counter {
                counts: match fields.remove("counts") {
                    Some(value) => parse_counts(value)?,
                    None => IndexMap::new(),
                },
            }),
            "event_log" => Ok(CrdtKind::EventLog {
                events: optional_elements(&mut fields, "events")?,
            }),
            "opaque" => Ok(CrdtKind::Opaque(fields)),
            other => Err(format!(
                "crdtState.kind must be one of gset, counter, event_log, opaque; got '{other}'"
            )),
        }
    }

    fn infer(mut fields: Map<String, Value>) -> Result<Self, String> {
        if matches!(fields.get("addSet"), Some(Value::Array(_))) {
            return Ok(CrdtKind::GSet {
                add_set: optional_elements(&mut fields, "addSet")?,
                remove_set: optional_elements(&mut fields, "removeSet")?,
            });
        }
        if matches!(fields.get("events"), Some(Value::Array(_))) {
            return Ok(CrdtKind::EventLog {
                events: optional_elements(&mut fields, "events")?,
            });
        }
        if matches!(fields.get("counts"), Some(Value::Object(_))) {
            if let Some(value) = fields.remove("counts") {
                return Ok(CrdtKind::Counter {
                    counts: parse_counts(value)?,
                });
            }
        }
        Ok(CrdtKind::Opaque(fields))
    }
}

impl CrdtState {
    pub fn new(kind: CrdtKind) -> Self {
        Self {
            kind,
            vector_clock: None,
        }
    }

    pub fn gset<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(CrdtKind::GSet {
            add_set: elements.into_iter().map(Into::into).collect(),
            remove_set: Vec::new(),
        })
    }

    pub fn event_log<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(CrdtKind::EventLog {
            events: events.into_iter().map(Into::into).collect(),
        })
    }

    pub fn with_vector_clock(mut self, clock: VectorClock) -> Self {
        self.vector_clock = Some(clock);
        self
    }

    pub fn add_set(&self) -> Option<&[String]> {
        match &self.kind {
            CrdtKind::GSet { add_set, .. } => Some(add_set),
            _ => None,
        }
    }

    pub fn events(&self) -> Option<&[String]> {
        match &self.kind {
            CrdtKind::EventLog { events } => Some(events),
            _ => None,
        }
    }

    /// A comparable rendering of the replicated value.
    ///
    /// Sets and event logs are sorted so that replicas holding the same
    /// elements in different orders agree. The vector clock is not part of it.
    pub fn fingerprint(&self) -> String {
        match &self.kind {
            CrdtKind::GSet { add_set, .. } => format!("set:{}", sorted_join(add_set)),
            CrdtKind::EventLog { events } => format!("events:{}", sorted_join(events)),
            CrdtKind::Counter { counts } => {
                let mut pairs: Vec<String> =
                    counts.iter().map(|(node, n)| format!("{node}={n}")).collect();
                pairs.sort();
                format!("counts:{}", pairs.join(","))
            }
            CrdtKind::Opaque(fields) => {
                format!("opaque:{}", serde_json::to_string(fields).unwrap_or_default())
            }
        }
    }
}

fn sorted_join(elements: &[String]) -> String {
    let mut sorted: Vec<&str> = elements.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(",")
}

fn element_key(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn optional_elements(fields: &mut Map<String, Value>, field: &str) -> Result<Vec<String>, String> {
    match fields.remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.into_iter().map(element_key).collect()),
        Some(_) => Err(format!("crdtState.{field} must be an array")),
    }
}

fn parse_counts(value: Value) -> Result<IndexMap<String, i64>, String> {
    let Value::Object(map) = value else {
        return Err("crdtState.counts must be an object".into());
    };
    map.into_iter()
        .map(|(node, n)| {
            n.as_i64()
                .map(|n| (node.clone(), n))
                .ok_or_else(|| format!("crdtState.counts.{node} must be an integer"))
        })
        .collect()
}

fn parse_vector_clock(value: Value) -> Result<VectorClock, String> {
    let Value::Object(map) = value else {
        return Err("crdtState.vectorClock must be an object".into());
    };
    map.into_iter()
        .map(|(node, tick)| {
            tick.as_u64()
                .map(|tick| (node.clone(), tick))
                .ok_or_else(|| format!("crdtState.vectorClock.{node} must be a non-negative integer"))
        })
        .collect()
}

impl Serialize for CrdtState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("kind", self.kind.tag())?;
        match &self.kind {
            CrdtKind::GSet {
                add_set,
                remove_set,
            } => {
                map.serialize_entry("addSet", add_set)?;
                if !remove_set.is_empty() {
                    map.serialize_entry("removeSet", remove_set)?;
                }
            }
            CrdtKind::Counter { counts } => map.serialize_entry("counts", counts)?,
            CrdtKind::EventLog { events } => map.serialize_entry("events", events)?,
            CrdtKind::Opaque(fields) => {
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
            }
        }
        if let Some(clock) = &self.vector_clock {
            map.serialize_entry("vectorClock", clock)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CrdtState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Value::Object(mut fields) = Value::deserialize(deserializer)? else {
            return Err(D::Error::custom("crdtState must be an object"));
        };
        let vector_clock = fields
            .remove("vectorClock")
            .filter(|v| !v.is_null())
            .map(parse_vector_clock)
            .transpose()
            .map_err(D::Error::custom)?;
        let kind = match fields.remove("kind") {
            Some(Value::String(tag)) => CrdtKind::from_tagged(&tag, fields),
            Some(_) => Err("crdtState.kind must be a string".into()),
            None => CrdtKind::infer(fields),
        }
        .map_err(D::Error::custom)?;
        Ok(CrdtState {
            kind,
            vector_clock,
        })
    }
}

//! Boundary guard between an untyped trace document and the typed model.
//!
//! [`validate_structure`] asserts the minimal schema and fails fast with the
//! first located problem. Decoding into [`Trace`] happens afterwards, one
//! step at a time, so decode errors stay located too.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use trunkline_ir::{BoundaryKey, Step, Trace};

use crate::normalizer::{NormalizeOptions, Normalizer};

/// Why a trace document was rejected.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("trace is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("trace must be a non-null object")]
    NotAnObject,
    #[error("trace.title is required and must be a string")]
    Title,
    #[error("trace.spec is required and must be an object")]
    Spec,
    #[error("trace.steps is required and must be a non-empty array")]
    Steps,
    #[error("step {step}: must be an object")]
    StepNotObject { step: usize },
    #[error("step {step}: id is required and must be a non-negative integer")]
    StepId { step: usize },
    #[error("step {step}: replicas is required and must be an object")]
    StepReplicas { step: usize },
    #[error("step {step}, replica {replica}: boundary {boundary} is required and must be a non-negative integer")]
    Boundary {
        step: usize,
        replica: String,
        boundary: BoundaryKey,
    },
    #[error("step {step}, replica {replica}: epoch is required and must be a non-negative integer")]
    Epoch { step: usize, replica: String },
    #[error("step {step}, replica {replica}: log is required and must be an array")]
    Log { step: usize, replica: String },
    #[error("step {step}: {source}")]
    StepShape {
        step: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("trace header: {source}")]
    Header {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Index of the offending step, when the error is located in one.
    pub fn step(&self) -> Option<usize> {
        match self {
            LoadError::StepNotObject { step }
            | LoadError::StepId { step }
            | LoadError::StepReplicas { step }
            | LoadError::Boundary { step, .. }
            | LoadError::Epoch { step, .. }
            | LoadError::Log { step, .. }
            | LoadError::StepShape { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Assert that `raw` satisfies the minimal trace schema.
///
/// - `title` is a string, `spec` an object, `steps` a non-empty array.
/// - Every step has a non-negative integer `id` and an object `replicas`.
/// - Every replica has non-negative integer `T`, `D`, `A`, `C`, `E` and
///   `epoch`, and an array `log`.
pub fn validate_structure(raw: &Value) -> Result<(), LoadError> {
    let obj = raw.as_object().ok_or(LoadError::NotAnObject)?;

    if !obj.get("title").is_some_and(Value::is_string) {
        return Err(LoadError::Title);
    }
    if !obj.get("spec").is_some_and(Value::is_object) {
        return Err(LoadError::Spec);
    }
    let steps = match obj.get("steps") {
        Some(Value::Array(steps)) if !steps.is_empty() => steps,
        _ => return Err(LoadError::Steps),
    };

    for (i, step) in steps.iter().enumerate() {
        let step = step
            .as_object()
            .ok_or(LoadError::StepNotObject { step: i })?;
        if !is_counter(step.get("id")) {
            return Err(LoadError::StepId { step: i });
        }
        let replicas = step
            .get("replicas")
            .and_then(Value::as_object)
            .ok_or(LoadError::StepReplicas { step: i })?;

        for (replica_id, replica) in replicas {
            validate_replica(i, replica_id, replica)?;
        }
    }

    Ok(())
}

fn validate_replica(step: usize, replica_id: &str, replica: &Value) -> Result<(), LoadError> {
    let empty = Map::new();
    let fields = replica.as_object().unwrap_or(&empty);

    for boundary in BoundaryKey::ALL {
        if !is_counter(fields.get(boundary.as_str())) {
            return Err(LoadError::Boundary {
                step,
                replica: replica_id.to_owned(),
                boundary,
            });
        }
    }
    if !is_counter(fields.get("epoch")) {
        return Err(LoadError::Epoch {
            step,
            replica: replica_id.to_owned(),
        });
    }
    if !fields.get("log").is_some_and(Value::is_array) {
        return Err(LoadError::Log {
            step,
            replica: replica_id.to_owned(),
        });
    }
    Ok(())
}

/// `1.0`, `-1` and `1.5` are numbers but not counters.
fn is_counter(value: Option<&Value>) -> bool {
    value.and_then(Value::as_u64).is_some()
}

/// Validate and decode a trace document. The result is not normalized.
pub fn load_trace_value(raw: Value) -> Result<Trace, LoadError> {
    validate_structure(&raw)?;

    let Value::Object(mut header) = raw else {
        return Err(LoadError::NotAnObject);
    };
    let raw_steps = match header.insert("steps".into(), Value::Array(Vec::new())) {
        Some(Value::Array(steps)) => steps,
        _ => return Err(LoadError::Steps),
    };

    let steps = raw_steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| {
            serde_json::from_value::<Step>(step).map_err(|source| LoadError::StepShape { step: i, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut trace: Trace = serde_json::from_value(Value::Object(header))
        .map_err(|source| LoadError::Header { source })?;
    trace.steps = steps;

    debug!(title = %trace.title, steps = trace.steps.len(), "decoded trace document");
    Ok(trace)
}

/// Parse, validate and decode a JSON trace document.
pub fn load_trace_str(raw: &str) -> Result<Trace, LoadError> {
    let value: Value = serde_json::from_str(raw).map_err(LoadError::Json)?;
    load_trace_value(value)
}

/// Parse, validate and normalize a JSON trace document in one call.
pub fn load_normalized(raw: &str, options: NormalizeOptions) -> Result<Trace, LoadError> {
    let trace = load_trace_str(raw)?;
    Ok(Normalizer::with_options(options).normalize(&trace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn replica() -> Value {
        json!({"epoch": 1, "T": 0, "D": 0, "A": 0, "C": 0, "E": 0, "log": []})
    }

    fn document() -> Value {
        json!({
            "title": "t",
            "spec": {"type": "Linearizable Register"},
            "steps": [{"id": 0, "replicas": {"R1": replica(), "R2": replica()}}]
        })
    }

    #[test]
    fn accepts_minimal_document() {
        let trace = load_trace_value(document()).unwrap();
        assert_eq!(trace.steps.len(), 1);
        let ids: Vec<&str> = trace.steps[0].replicas.keys().map(String::as_str).collect();
        assert_eq!(ids, ["R1", "R2"]);
    }

    #[test]
    fn rejects_non_object() {
        assert!(matches!(load_trace_value(json!([1, 2])), Err(LoadError::NotAnObject)));
        assert!(matches!(load_trace_value(Value::Null), Err(LoadError::NotAnObject)));
    }

    #[test]
    fn rejects_missing_title_spec_and_empty_steps() {
        let mut doc = document();
        doc.as_object_mut().unwrap().remove("title");
        assert!(matches!(load_trace_value(doc), Err(LoadError::Title)));

        let mut doc = document();
        doc["spec"] = json!("register");
        assert!(matches!(load_trace_value(doc), Err(LoadError::Spec)));

        let mut doc = document();
        doc["steps"] = json!([]);
        assert!(matches!(load_trace_value(doc), Err(LoadError::Steps)));
    }

    #[test]
    fn step_errors_name_the_step_index() {
        let mut doc = document();
        doc["steps"].as_array_mut().unwrap().push(json!({"id": "one", "replicas": {}}));
        let err = load_trace_value(doc).unwrap_err();
        assert!(matches!(err, LoadError::StepId { step: 1 }));
        assert_eq!(err.to_string(), "step 1: id is required and must be a non-negative integer");
        assert_eq!(err.step(), Some(1));

        let mut doc = document();
        doc["steps"][0]["replicas"] = json!([]);
        assert!(matches!(load_trace_value(doc), Err(LoadError::StepReplicas { step: 0 })));
    }

    #[test]
    fn replica_errors_name_replica_and_field() {
        let mut doc = document();
        doc["steps"][0]["replicas"]["R2"]["C"] = json!("1");
        let err = load_trace_value(doc).unwrap_err();
        assert_eq!(
            err.to_string(),
            "step 0, replica R2: boundary C is required and must be a non-negative integer"
        );

        let mut doc = document();
        doc["steps"][0]["replicas"]["R1"].as_object_mut().unwrap().remove("epoch");
        assert!(matches!(
            load_trace_value(doc),
            Err(LoadError::Epoch { step: 0, ref replica }) if replica == "R1"
        ));

        let mut doc = document();
        doc["steps"][0]["replicas"]["R1"]["log"] = json!({});
        assert!(matches!(load_trace_value(doc), Err(LoadError::Log { step: 0, .. })));
    }

    #[test]
    fn non_integer_counters_name_replica_and_field() {
        for bad in [json!(-1), json!(1.0), json!(1.5)] {
            let mut doc = document();
            doc["steps"][0]["replicas"]["R2"]["C"] = bad.clone();
            let err = load_trace_value(doc).unwrap_err();
            assert!(
                matches!(
                    err,
                    LoadError::Boundary { step: 0, ref replica, boundary: BoundaryKey::C } if replica == "R2"
                ),
                "C = {bad}: got {err}"
            );
        }

        let mut doc = document();
        doc["steps"][0]["replicas"]["R1"]["epoch"] = json!(-2);
        assert!(matches!(
            load_trace_value(doc),
            Err(LoadError::Epoch { step: 0, ref replica }) if replica == "R1"
        ));

        let mut doc = document();
        doc["steps"][0]["id"] = json!(0.5);
        assert!(matches!(load_trace_value(doc), Err(LoadError::StepId { step: 0 })));
    }

    #[test]
    fn decode_errors_stay_located() {
        let mut doc = document();
        doc["steps"][0]["replicas"]["R1"]["log"] = json!([{"idx": 1}]);
        let err = load_trace_value(doc).unwrap_err();
        assert!(matches!(err, LoadError::StepShape { step: 0, .. }), "got {err}");
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(load_trace_str("{not json"), Err(LoadError::Json(_))));
    }
}

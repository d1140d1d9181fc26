//! Bulk populate: restore previously submitted repeated values

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::container::{Container, ContainerError, Instance};
use crate::materialize::Overrides;

/// Replace placeholder instances with one instance per record, in order
pub fn populate(container: &mut Container, records: &[Value]) -> Result<Vec<Instance>, ContainerError> {
    let cleared = container.clear_placeholders();
    let overrides: Vec<Overrides> = records.iter().map(record_overrides).collect();
    debug!(records = records.len(), cleared, "populating container");
    container.add_many(&overrides)
}

/// Flatten a record into dotted-key default values
///
/// Nested objects become `outer.inner` keys; arrays are left to the nested
/// container that owns them.
pub fn record_overrides(record: &Value) -> Overrides {
    let mut out = Overrides::new();
    match record {
        Value::Object(map) => flatten_into(&mut out, "", map),
        other => warn!(kind = value_kind(other), "record is not an object, using template defaults"),
    }
    out
}

fn flatten_into(out: &mut Overrides, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) => flatten_into(out, &path, inner),
            Value::Array(_) => debug!(key = %path, "skipping array value"),
            Value::String(s) => {
                out.insert(path, s.clone());
            }
            Value::Null => {
                out.insert(path, String::new());
            }
            Value::Bool(_) | Value::Number(_) => {
                out.insert(path, value.to_string());
            }
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Persistable projection of instance field maps.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Keep only entries naming schema columns, scrubbing nested objects
/// recursively. A nested object that ends up empty is omitted entirely;
/// scalars, arrays, and non-empty objects are preserved as-is.
pub fn extract_data(fields: &Map<String, Value>, columns: &HashSet<String>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in fields {
        if !columns.contains(key) {
            continue;
        }
        if let Some(v) = scrub(value) {
            out.insert(key.clone(), v);
        }
    }
    out
}

fn scrub(value: &Value) -> Option<Value> {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                if let Some(v) = scrub(value) {
                    out.insert(key.clone(), v);
                }
            }
            if out.is_empty() {
                None
            } else {
                Some(Value::Object(out))
            }
        }
        other => Some(other.clone()),
    }
}

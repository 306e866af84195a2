//! Canonical JSON used to compare projections.
//!
//! Object keys are sorted at every level, arrays keep their order and
//! scalars pass through. Two projections are equal iff their canonical text
//! is identical.

use serde_json::{Map, Value};

pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort();
            let mut out = Map::with_capacity(map.len());
            for key in keys {
                if let Some(v) = map.get(key) {
                    out.insert(key.clone(), canonicalize(v));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        scalar => scalar.clone(),
    }
}

/// Compact canonical serialization.
pub fn canonical_text(value: &Value) -> String {
    canonicalize(value).to_string()
}

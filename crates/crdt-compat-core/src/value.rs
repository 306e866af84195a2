//! Scalar values stored in containers and awareness states.

use ciborium::value::{Integer, Value as CborValue};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Binary(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

#[derive(Debug, Error)]
pub enum ValueCodecError {
    #[error("cbor encode failed: {0}")]
    Encode(String),
    #[error("cbor decode failed: {0}")]
    Decode(String),
    #[error("unsupported cbor item: {0}")]
    Unsupported(&'static str),
}

impl Value {
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// JSON projection. Binary payloads become arrays of byte numbers and
    /// non-finite floats become `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::I64(n) => JsonValue::from(*n),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Binary(bytes) => {
                JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
            }
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    pub(crate) fn to_cbor(&self) -> CborValue {
        match self {
            Value::Null => CborValue::Null,
            Value::Bool(b) => CborValue::Bool(*b),
            Value::I64(n) => CborValue::Integer(Integer::from(*n)),
            Value::F64(f) => CborValue::Float(*f),
            Value::String(s) => CborValue::Text(s.clone()),
            Value::Binary(bytes) => CborValue::Bytes(bytes.clone()),
            Value::List(items) => CborValue::Array(items.iter().map(Value::to_cbor).collect()),
            Value::Map(entries) => CborValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (CborValue::Text(k.clone()), v.to_cbor()))
                    .collect(),
            ),
        }
    }

    pub(crate) fn from_cbor(value: CborValue) -> Result<Self, ValueCodecError> {
        Ok(match value {
            CborValue::Null => Value::Null,
            CborValue::Bool(b) => Value::Bool(b),
            CborValue::Integer(n) => {
                let wide = i128::from(n);
                Value::I64(
                    i64::try_from(wide).map_err(|_| ValueCodecError::Unsupported("integer"))?,
                )
            }
            CborValue::Float(f) => Value::F64(f),
            CborValue::Text(s) => Value::String(s),
            CborValue::Bytes(b) => Value::Binary(b),
            CborValue::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::from_cbor)
                    .collect::<Result<_, _>>()?,
            ),
            CborValue::Map(entries) => {
                let mut out = BTreeMap::new();
                for (k, v) in entries {
                    let CborValue::Text(key) = k else {
                        return Err(ValueCodecError::Unsupported("non-text map key"));
                    };
                    out.insert(key, Value::from_cbor(v)?);
                }
                Value::Map(out)
            }
            CborValue::Tag(..) => return Err(ValueCodecError::Unsupported("tag")),
            _ => return Err(ValueCodecError::Unsupported("simple value")),
        })
    }

    pub fn encode_cbor(&self) -> Result<Vec<u8>, ValueCodecError> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(&self.to_cbor(), &mut out)
            .map_err(|e| ValueCodecError::Encode(e.to_string()))?;
        Ok(out)
    }

    pub fn decode_cbor(data: &[u8]) -> Result<Self, ValueCodecError> {
        let cbor: CborValue =
            ciborium::de::from_reader(data).map_err(|e| ValueCodecError::Decode(e.to_string()))?;
        Value::from_cbor(cbor)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I64(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_projection_of_mixed_values() {
        let v = Value::map([
            ("n", Value::Null),
            ("bin", Value::Binary(vec![1, 2, 3])),
            ("list", Value::List(vec![1.into(), "a".into(), false.into()])),
            ("f", 1.5.into()),
        ]);
        assert_eq!(
            v.to_json(),
            json!({"bin": [1, 2, 3], "f": 1.5, "list": [1, "a", false], "n": null})
        );
    }

    #[test]
    fn cbor_keeps_integer_and_float_distinct() {
        let v = Value::List(vec![Value::I64(1), Value::F64(1.0), Value::Binary(vec![9])]);
        let bytes = v.encode_cbor().expect("encode");
        assert_eq!(Value::decode_cbor(&bytes).expect("decode"), v);
    }
}

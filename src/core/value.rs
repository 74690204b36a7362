//! HostValue: the host runtime's structured-data shape, and the codec
//! between it and the engine's JSON documents.
//!
//! | Host | Engine (`serde_json::Value`) |
//! |------|------------------------------|
//! | `Null` | `null` |
//! | `Bool` | `true` / `false` |
//! | `Int` (i64) | integer number |
//! | `Float` (f64, finite) | floating-point number |
//! | `String` | string |
//! | `List` | array |
//! | `Map` | object |
//!
//! Both directions are total over the supported set and lossless:
//! `decode(&encode(&x)?)? == x`. Anything outside the set fails with
//! [`CodecError::UnsupportedType`] and must be routed through the error
//! translator by the caller.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Codec failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
}

/// A value as the host sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<HostValue>),
    Map(BTreeMap<String, HostValue>),
}

impl HostValue {
    pub fn map() -> Self {
        HostValue::Map(BTreeMap::new())
    }

    /// Insert into a map value; no-op on anything else.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Self {
        if let HostValue::Map(ref mut entries) = self {
            entries.insert(key.into(), value.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&HostValue> {
        match self {
            HostValue::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::String(_) => "string",
            HostValue::List(_) => "list",
            HostValue::Map(_) => "map",
        }
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self { HostValue::String(s.to_string()) }
}
impl From<String> for HostValue {
    fn from(s: String) -> Self { HostValue::String(s) }
}
impl From<bool> for HostValue {
    fn from(b: bool) -> Self { HostValue::Bool(b) }
}
impl From<i64> for HostValue {
    fn from(n: i64) -> Self { HostValue::Int(n) }
}
impl From<f64> for HostValue {
    fn from(n: f64) -> Self { HostValue::Float(n) }
}
impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self { HostValue::List(items) }
}

/// Engine document -> host value
pub fn encode(document: &Value) -> Result<HostValue, CodecError> {
    Ok(match document {
        Value::Null => HostValue::Null,
        Value::Bool(b) => HostValue::Bool(*b),
        Value::Number(n) => encode_number(n)?,
        Value::String(s) => HostValue::String(s.clone()),
        Value::Array(items) => HostValue::List(items.iter().map(encode).collect::<Result<_, _>>()?),
        Value::Object(entries) => HostValue::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), encode(v)?)))
                .collect::<Result<_, CodecError>>()?,
        ),
    })
}

fn encode_number(n: &Number) -> Result<HostValue, CodecError> {
    if let Some(i) = n.as_i64() {
        return Ok(HostValue::Int(i));
    }
    if n.is_u64() {
        // Host integers are signed 64-bit
        return Err(CodecError::UnsupportedType(format!("integer {} exceeds i64", n)));
    }
    n.as_f64()
        .map(HostValue::Float)
        .ok_or_else(|| CodecError::UnsupportedType(format!("number {}", n)))
}

/// Host value -> engine document
pub fn decode(value: &HostValue) -> Result<Value, CodecError> {
    Ok(match value {
        HostValue::Null => Value::Null,
        HostValue::Bool(b) => Value::Bool(*b),
        HostValue::Int(i) => Value::Number(Number::from(*i)),
        HostValue::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| CodecError::UnsupportedType(format!("non-finite float {}", f)))?,
        HostValue::String(s) => Value::String(s.clone()),
        HostValue::List(items) => Value::Array(items.iter().map(decode).collect::<Result<_, _>>()?),
        HostValue::Map(entries) => {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(k.clone(), decode(v)?);
            }
            Value::Object(map)
        }
    })
}

//! Host primitives -> engine argument types. Every failure names its site.

use crate::core::value::{decode, HostValue};
use crate::engine::{Mnemonics, Passphrase};
use crate::errors::{BridgeError, ErrorCode};
use serde_json::{Map, Value};

pub(crate) fn require_user_id<'a>(user_id: &'a str, site: &'static str) -> Result<&'a str, BridgeError> {
    if user_id.trim().is_empty() {
        return Err(BridgeError::validation(site, ErrorCode::InvalidUserId, "empty user id"));
    }
    Ok(user_id)
}

/// Whole seconds, base 10, surrounding whitespace ignored
pub(crate) fn parse_expiry(raw: &str, site: &'static str) -> Result<u64, BridgeError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| BridgeError::validation(site, ErrorCode::InvalidSessionExpiryTime, format!("{:?}: {}", raw, e)))
}

fn parse_array(raw: &str, site: &'static str) -> Result<Vec<Value>, BridgeError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(BridgeError::parse(site, ErrorCode::InvalidJsonArray, format!("expected array, got {}", kind(&other)))),
        Err(e) => Err(BridgeError::parse(site, ErrorCode::InvalidJsonArray, e.to_string())),
    }
}

/// JSON array of strings
pub(crate) fn parse_address_list(raw: &str, site: &'static str) -> Result<Vec<String>, BridgeError> {
    parse_array(raw, site)?
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(BridgeError::parse(site, ErrorCode::InvalidJsonArray, format!("address is {}", kind(&other)))),
        })
        .collect()
}

/// JSON array of decimal strings or numbers; numbers keep their decimal text
pub(crate) fn parse_amount_list(raw: &str, site: &'static str) -> Result<Vec<String>, BridgeError> {
    parse_array(raw, site)?
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(BridgeError::parse(site, ErrorCode::InvalidJsonArray, format!("amount is {}", kind(&other)))),
        })
        .collect()
}

/// Host map -> document map. Null means empty.
pub(crate) fn parse_map(value: &HostValue, site: &'static str) -> Result<Map<String, Value>, BridgeError> {
    match value {
        HostValue::Null => Ok(Map::new()),
        HostValue::Map(_) => match decode(value).map_err(BridgeError::codec(site))? {
            Value::Object(map) => Ok(map),
            _ => Err(BridgeError::parse(site, ErrorCode::InvalidJsonObject, "decoded map is not an object")),
        },
        other => Err(BridgeError::parse(site, ErrorCode::InvalidJsonObject, format!("expected map, got {}", other.type_name()))),
    }
}

pub(crate) fn parse_qr_payload(raw: &str, site: &'static str) -> Result<Value, BridgeError> {
    serde_json::from_str(raw).map_err(|e| BridgeError::parse(site, ErrorCode::InvalidJsonString, e.to_string()))
}

pub(crate) fn passphrase(user_id: &str, pin: &str, salt: &str, site: &'static str) -> Result<Passphrase, BridgeError> {
    Passphrase::new(user_id, pin, salt)
        .map_err(|e| BridgeError::validation(site, ErrorCode::InvalidUserPassphrase, e.to_string()))
}

pub(crate) fn mnemonics(phrase: &str, site: &'static str) -> Result<Mnemonics, BridgeError> {
    Mnemonics::new(phrase).map_err(|e| BridgeError::validation(site, ErrorCode::InvalidMnemonics, e.to_string()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

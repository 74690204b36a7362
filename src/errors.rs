//! Error translation: every failure crossing the boundary becomes an
//! [`ErrorPayload`] with a stable code.
//!
//! | Failure | Detected | Code |
//! |---------|----------|------|
//! | [`BridgeError::Parse`] | locally, before dispatch | per site (`INVALID_JSON_*`) |
//! | [`BridgeError::Validation`] | locally, before dispatch | per site |
//! | [`BridgeError::Codec`] / [`CodecError`] | codec | `UNSUPPORTED_TYPE` |
//! | [`EngineError`] | engine | forwarded unchanged |
//! | anything else | - | `UNKNOWN_ERROR` |

use crate::core::value::{CodecError, HostValue};
use serde::Serialize;
use std::fmt;

/// Stable error codes observable by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidJsonArray,
    InvalidJsonString,
    InvalidJsonObject,
    InvalidSessionExpiryTime,
    InvalidUserPassphrase,
    InvalidUserId,
    InvalidMnemonics,
    UnsupportedType,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidJsonArray => "INVALID_JSON_ARRAY",
            ErrorCode::InvalidJsonString => "INVALID_JSON_STRING",
            ErrorCode::InvalidJsonObject => "INVALID_JSON_OBJECT",
            ErrorCode::InvalidSessionExpiryTime => "INVALID_SESSION_EXPIRY_TIME",
            ErrorCode::InvalidUserPassphrase => "INVALID_USER_PASSPHRASE",
            ErrorCode::InvalidUserId => "INVALID_USER_ID",
            ErrorCode::InvalidMnemonics => "INVALID_MNEMONICS",
            ErrorCode::UnsupportedType => "UNSUPPORTED_TYPE",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidJsonArray => "Expected a JSON array of addresses or amounts",
            ErrorCode::InvalidJsonString => "Expected a valid JSON string",
            ErrorCode::InvalidJsonObject => "Expected a map of string keys",
            ErrorCode::InvalidSessionExpiryTime => "Session expiry must be a whole number of seconds",
            ErrorCode::InvalidUserPassphrase => "The pin or salt does not form a valid passphrase",
            ErrorCode::InvalidUserId => "A user id is required",
            ErrorCode::InvalidMnemonics => "The mnemonic phrase is empty",
            ErrorCode::UnsupportedType => "The value contains a type that cannot cross the boundary",
            ErrorCode::UnknownError => "Something went wrong, please try again",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The failure as the host receives it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: String,
    pub internal_reason: String,
    pub human_message: String,
}

impl ErrorPayload {
    pub fn new(code: ErrorCode, site: &str) -> Self {
        Self {
            code: code.as_str().to_string(),
            internal_reason: site.to_string(),
            human_message: code.message().to_string(),
        }
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code.as_str()
    }

    pub fn to_host_value(&self) -> HostValue {
        HostValue::map()
            .with("code", self.code.as_str())
            .with("internalReason", self.internal_reason.as_str())
            .with("humanMessage", self.human_message.as_str())
    }
}

/// Failures detected on this side of the boundary
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("{code} at {site}: {reason}")]
    Parse { site: &'static str, code: ErrorCode, reason: String },
    #[error("{code} at {site}: {reason}")]
    Validation { site: &'static str, code: ErrorCode, reason: String },
    #[error("codec at {site}: {source}")]
    Codec {
        site: &'static str,
        #[source]
        source: CodecError,
    },
    #[error("panicked: {0}")]
    Panicked(String),
}

impl BridgeError {
    pub fn parse(site: &'static str, code: ErrorCode, reason: impl Into<String>) -> Self {
        BridgeError::Parse { site, code, reason: reason.into() }
    }

    pub fn validation(site: &'static str, code: ErrorCode, reason: impl Into<String>) -> Self {
        BridgeError::Validation { site, code, reason: reason.into() }
    }

    /// For `map_err` on codec results
    pub fn codec(site: &'static str) -> impl FnOnce(CodecError) -> BridgeError {
        move |source| BridgeError::Codec { site, source }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            BridgeError::Parse { code, .. } | BridgeError::Validation { code, .. } => *code,
            BridgeError::Codec { .. } => ErrorCode::UnsupportedType,
            BridgeError::Panicked(_) => ErrorCode::UnknownError,
        }
    }

    fn site(&self) -> Option<&'static str> {
        match self {
            BridgeError::Parse { site, .. }
            | BridgeError::Validation { site, .. }
            | BridgeError::Codec { site, .. } => Some(*site),
            BridgeError::Panicked(_) => None,
        }
    }
}

/// Failure reported by the engine. Its code is forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct EngineError {
    pub code: String,
    pub internal_id: Option<String>,
    pub message: String,
}

impl EngineError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), internal_id: None, message: message.into() }
    }

    pub fn with_internal_id(mut self, id: impl Into<String>) -> Self {
        self.internal_id = Some(id.into());
        self
    }
}

/// Map any failure to its payload. Total: unknown failures become
/// `UNKNOWN_ERROR`.
pub fn translate(failure: &anyhow::Error, origin_site: &str) -> ErrorPayload {
    for cause in failure.chain() {
        if let Some(err) = cause.downcast_ref::<EngineError>() {
            return ErrorPayload {
                code: err.code.clone(),
                internal_reason: err.internal_id.clone().unwrap_or_else(|| origin_site.to_string()),
                human_message: err.message.clone(),
            };
        }
        if let Some(err) = cause.downcast_ref::<BridgeError>() {
            return ErrorPayload::new(err.code(), err.site().unwrap_or(origin_site));
        }
        if cause.downcast_ref::<CodecError>().is_some() {
            return ErrorPayload::new(ErrorCode::UnsupportedType, origin_site);
        }
    }
    tracing::debug!(site = origin_site, "untyped failure: {:#}", failure);
    ErrorPayload::new(ErrorCode::UnknownError, origin_site)
}

//! Workflow callbacks: what the engine calls while an operation runs.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──dispatch──▶ Dispatched ──complete──▶ Completed
//!    │                   │  ▲    │
//!    │                   └──┘    ├──error──────▶ Errored
//!    │                 progress/ │
//!    │                 ack       └──interrupt──▶ Interrupted
//!    └──interrupt (validation failed)──────────▶ Interrupted
//! ```
//!
//! Terminal states accept nothing: a late call is logged and dropped.
//!
//! # Envelope on the host side
//!
//! | Key | Value |
//! |-----|-------|
//! | `operationKind` | `OperationKind` label |
//! | `correlationId` | caller-supplied id |
//! | `stage` | `acknowledged` / `progress` / `complete` / `error` |
//! | `step` | progress step name (progress only) |
//! | `data` | encoded engine document |
//! | `errorPayload` | `{code, internalReason, humanMessage}` (error only) |

mod adapter;

pub use adapter::{DirectCallback, FanOutCallback};

use crate::core::context::OperationContext;
use crate::core::value::HostValue;
use crate::errors::ErrorPayload;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Capability set the engine drives for one operation
pub trait WorkflowCallback: Send + Sync {
    fn correlation_id(&self) -> &str;
    fn context(&self) -> OperationContext;

    /// Engine accepted the request
    fn on_acknowledged(&self, data: Value);
    /// Intermediate update, delivered in call order
    fn on_progress(&self, step: &str, data: Value);
    /// Terminal success
    fn on_complete(&self, data: Value);
    /// Terminal failure reported by the engine
    fn on_error(&self, failure: anyhow::Error);
    /// Terminal failure with an explicit context, used when the operation
    /// fails before (or while) being dispatched.
    fn interrupt(&self, context: OperationContext, failure: anyhow::Error);

    fn is_terminated(&self) -> bool;
}

/// Lifecycle stage of an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Acknowledged,
    Progress,
    Complete,
    Error,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Acknowledged => "acknowledged",
            Stage::Progress => "progress",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }
}

/// Event body, already encoded for the host
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Acknowledged(HostValue),
    Progress { step: String, data: HostValue },
    Complete(HostValue),
    Error(ErrorPayload),
}

impl Event {
    pub fn stage(&self) -> Stage {
        match self {
            Event::Acknowledged(_) => Stage::Acknowledged,
            Event::Progress { .. } => Stage::Progress,
            Event::Complete(_) => Stage::Complete,
            Event::Error(_) => Stage::Error,
        }
    }
}

/// One delivery across the boundary
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub context: OperationContext,
    pub correlation_id: String,
    pub event: Event,
}

impl Envelope {
    pub fn stage(&self) -> Stage {
        self.event.stage()
    }

    pub fn data(&self) -> Option<&HostValue> {
        match &self.event {
            Event::Acknowledged(data) | Event::Complete(data) | Event::Progress { data, .. } => Some(data),
            Event::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorPayload> {
        match &self.event {
            Event::Error(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn to_host_value(&self) -> HostValue {
        let base = HostValue::map()
            .with("operationKind", self.context.kind().as_str())
            .with("correlationId", self.correlation_id.as_str())
            .with("stage", self.stage().as_str());
        match &self.event {
            Event::Acknowledged(data) | Event::Complete(data) => base.with("data", data.clone()),
            Event::Progress { step, data } => base.with("step", step.as_str()).with("data", data.clone()),
            Event::Error(payload) => base.with("errorPayload", payload.to_host_value()),
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_host_value().serialize(serializer)
    }
}

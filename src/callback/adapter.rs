//! The two callback variants: direct-only and direct + registry fan-out.
//!
//! Both share `CallbackCore`, which owns the per-operation state machine.
//! Envelopes are queued while the state lock is held and delivered after
//! it is released by whichever thread claimed the queue. Events of one
//! operation reach every sink in call order, nothing slips past a
//! terminal event, and a sink may call back into the operation.

use super::{Envelope, Event, Stage, WorkflowCallback};
use crate::core::context::OperationContext;
use crate::core::sites;
use crate::core::value::{encode, CodecError};
use crate::errors::{translate, BridgeError};
use crate::registry::CorrelationRegistry;
use crate::sink::{deliver_guarded, EventSink};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkflowState {
    Created,
    Dispatched,
    Completed,
    Errored,
    Interrupted,
}

impl WorkflowState {
    fn is_terminal(self) -> bool {
        matches!(self, WorkflowState::Completed | WorkflowState::Errored | WorkflowState::Interrupted)
    }

    fn as_str(self) -> &'static str {
        match self {
            WorkflowState::Created => "created",
            WorkflowState::Dispatched => "dispatched",
            WorkflowState::Completed => "completed",
            WorkflowState::Errored => "errored",
            WorkflowState::Interrupted => "interrupted",
        }
    }
}

enum Signal {
    Acknowledged(Value),
    Progress(String, Value),
    Complete(Value),
    Error(anyhow::Error),
    Interrupt(OperationContext, anyhow::Error),
}

impl Signal {
    fn name(&self) -> &'static str {
        match self {
            Signal::Acknowledged(_) => "acknowledged",
            Signal::Progress(..) => "progress",
            Signal::Complete(_) => "complete",
            Signal::Error(_) => "error",
            Signal::Interrupt(..) => "interrupt",
        }
    }
}

struct Lifecycle {
    state: WorkflowState,
    pending: VecDeque<Envelope>,
    draining: bool,
}

struct CallbackCore {
    correlation_id: String,
    context: OperationContext,
    origin: &'static str,
    host: Arc<dyn EventSink>,
    lifecycle: Mutex<Lifecycle>,
}

impl CallbackCore {
    fn new(correlation_id: String, context: OperationContext, origin: &'static str, host: Arc<dyn EventSink>) -> Self {
        let lifecycle = Lifecycle { state: WorkflowState::Created, pending: VecDeque::new(), draining: false };
        Self { correlation_id, context, origin, host, lifecycle: Mutex::new(lifecycle) }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_terminated(&self) -> bool {
        self.lifecycle().state.is_terminal()
    }

    fn begin(&self) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state == WorkflowState::Created {
            lifecycle.state = WorkflowState::Dispatched;
        }
    }

    /// Build one envelope and queue it for delivery. Returns the stage
    /// queued, or `None` when the operation had already terminated. The
    /// envelope may be delivered by another thread already draining.
    fn emit(&self, signal: Signal, fan_out: &dyn Fn(&Envelope)) -> Option<Stage> {
        let stage = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state.is_terminal() {
                tracing::warn!(
                    correlation_id = %self.correlation_id,
                    kind = %self.context.kind(),
                    state = lifecycle.state.as_str(),
                    signal = signal.name(),
                    "callback after terminal event dropped"
                );
                return None;
            }

            let (context, event, next) = self.build(signal);
            let envelope = Envelope { context, correlation_id: self.correlation_id.clone(), event };
            lifecycle.state = next;
            if next.is_terminal() {
                tracing::debug!(correlation_id = %self.correlation_id, kind = %context.kind(), state = next.as_str(), "operation finished");
            }
            let stage = envelope.stage();
            lifecycle.pending.push_back(envelope);
            if lifecycle.draining {
                return Some(stage);
            }
            lifecycle.draining = true;
            stage
        };
        self.drain(fan_out);
        Some(stage)
    }

    fn drain(&self, fan_out: &dyn Fn(&Envelope)) {
        loop {
            let envelope = {
                let mut lifecycle = self.lifecycle();
                match lifecycle.pending.pop_front() {
                    Some(envelope) => envelope,
                    None => {
                        lifecycle.draining = false;
                        return;
                    }
                }
            };
            deliver_guarded(&*self.host, &envelope);
            fan_out(&envelope);
        }
    }

    fn build(&self, signal: Signal) -> (OperationContext, Event, WorkflowState) {
        let ctx = self.context;
        match signal {
            Signal::Acknowledged(data) => match encode(&data) {
                Ok(data) => (ctx, Event::Acknowledged(data), WorkflowState::Dispatched),
                Err(e) => self.encode_failure(e),
            },
            Signal::Progress(step, data) => match encode(&data) {
                Ok(data) => (ctx, Event::Progress { step, data }, WorkflowState::Dispatched),
                Err(e) => self.encode_failure(e),
            },
            Signal::Complete(data) => match encode(&data) {
                Ok(data) => (ctx, Event::Complete(data), WorkflowState::Completed),
                Err(e) => self.encode_failure(e),
            },
            Signal::Error(failure) => (ctx, Event::Error(translate(&failure, self.origin)), WorkflowState::Errored),
            Signal::Interrupt(context, failure) => {
                (context, Event::Error(translate(&failure, self.origin)), WorkflowState::Interrupted)
            }
        }
    }

    // A payload the host cannot represent ends the operation with an error
    // rather than a partial document.
    fn encode_failure(&self, err: CodecError) -> (OperationContext, Event, WorkflowState) {
        tracing::warn!(correlation_id = %self.correlation_id, kind = %self.context.kind(), "payload encode failed: {}", err);
        let failure = anyhow::Error::new(BridgeError::codec(sites::callback::ENCODE_PAYLOAD)(err));
        (self.context, Event::Error(translate(&failure, self.origin)), WorkflowState::Errored)
    }
}

/// Delivers to the host channel only
pub struct DirectCallback {
    core: CallbackCore,
}

impl DirectCallback {
    pub fn new(
        correlation_id: impl Into<String>,
        context: OperationContext,
        origin: &'static str,
        host: Arc<dyn EventSink>,
    ) -> Self {
        Self { core: CallbackCore::new(correlation_id.into(), context, origin, host) }
    }

    /// Mark the operation as handed to the engine
    pub fn begin(&self) {
        self.core.begin();
    }
}

impl WorkflowCallback for DirectCallback {
    fn correlation_id(&self) -> &str { &self.core.correlation_id }
    fn context(&self) -> OperationContext { self.core.context }

    fn on_acknowledged(&self, data: Value) {
        self.core.emit(Signal::Acknowledged(data), &|_| {});
    }
    fn on_progress(&self, step: &str, data: Value) {
        self.core.emit(Signal::Progress(step.to_string(), data), &|_| {});
    }
    fn on_complete(&self, data: Value) {
        self.core.emit(Signal::Complete(data), &|_| {});
    }
    fn on_error(&self, failure: anyhow::Error) {
        self.core.emit(Signal::Error(failure), &|_| {});
    }
    fn interrupt(&self, context: OperationContext, failure: anyhow::Error) {
        self.core.emit(Signal::Interrupt(context, failure), &|_| {});
    }

    fn is_terminated(&self) -> bool { self.core.is_terminated() }
}

/// Delivers to the host channel and to every registry subscriber of the
/// correlation id. Holds the id's in-flight registry entry from `begin`
/// until its terminal event; subscriptions stay with their callers.
pub struct FanOutCallback {
    core: CallbackCore,
    registry: Arc<CorrelationRegistry>,
    opened: AtomicBool,
}

impl FanOutCallback {
    pub fn new(
        correlation_id: impl Into<String>,
        context: OperationContext,
        origin: &'static str,
        host: Arc<dyn EventSink>,
        registry: Arc<CorrelationRegistry>,
    ) -> Self {
        let core = CallbackCore::new(correlation_id.into(), context, origin, host);
        Self { core, registry, opened: AtomicBool::new(false) }
    }

    /// Mark dispatched and open the id in the registry
    pub fn begin(&self) {
        self.core.begin();
        self.registry.open(&self.core.correlation_id);
        self.opened.store(true, Ordering::Release);
    }

    fn emit(&self, signal: Signal) {
        self.core.emit(signal, &|envelope| self.publish(envelope));
    }

    fn publish(&self, envelope: &Envelope) {
        let id = &self.core.correlation_id;
        // Failed before dispatch: only callers that subscribed ahead of time are listening
        if self.opened.load(Ordering::Acquire) || self.registry.contains(id) {
            self.registry.publish(id, envelope);
        } else {
            tracing::debug!(correlation_id = %id, stage = envelope.stage().as_str(), "not dispatched and no subscribers");
        }
        if envelope.stage().is_terminal() {
            self.registry.release(id);
        }
    }
}

impl WorkflowCallback for FanOutCallback {
    fn correlation_id(&self) -> &str { &self.core.correlation_id }
    fn context(&self) -> OperationContext { self.core.context }

    fn on_acknowledged(&self, data: Value) { self.emit(Signal::Acknowledged(data)); }
    fn on_progress(&self, step: &str, data: Value) { self.emit(Signal::Progress(step.to_string(), data)); }
    fn on_complete(&self, data: Value) { self.emit(Signal::Complete(data)); }
    fn on_error(&self, failure: anyhow::Error) { self.emit(Signal::Error(failure)); }
    fn interrupt(&self, context: OperationContext, failure: anyhow::Error) {
        self.emit(Signal::Interrupt(context, failure));
    }

    fn is_terminated(&self) -> bool { self.core.is_terminated() }
}

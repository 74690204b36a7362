//! Launching one operation: validate, dispatch, or interrupt.
//!
//! The body runs inside `catch_unwind`. Any `Err` it returns (local
//! validation, or the engine refusing to start) and any panic become an
//! interruption on the operation's callback. Nothing escapes to the host.

use crate::callback::{DirectCallback, FanOutCallback, WorkflowCallback};
use crate::errors::{translate, BridgeError, ErrorPayload};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Callback variants the launcher can hand to the engine
pub(crate) trait Dispatchable: WorkflowCallback + 'static {
    fn begin(&self);
}

impl Dispatchable for DirectCallback {
    fn begin(&self) { DirectCallback::begin(self) }
}

impl Dispatchable for FanOutCallback {
    fn begin(&self) { FanOutCallback::begin(self) }
}

pub(crate) struct Dispatcher<C> {
    callback: Arc<C>,
}

impl<C: Dispatchable> Dispatcher<C> {
    /// Mark the operation dispatched and give the engine its callback.
    /// Call only after every argument is validated.
    pub(crate) fn dispatch(
        &self,
        call: impl FnOnce(Arc<dyn WorkflowCallback>) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        self.callback.begin();
        call(self.callback.clone())
    }
}

pub(crate) fn launch<C: Dispatchable>(
    callback: C,
    origin: &'static str,
    body: impl FnOnce(&Dispatcher<C>) -> anyhow::Result<()>,
) {
    let callback = Arc::new(callback);
    let dispatcher = Dispatcher { callback: callback.clone() };
    let failure = match panic::catch_unwind(AssertUnwindSafe(|| body(&dispatcher))) {
        Ok(Ok(())) => return,
        Ok(Err(failure)) => failure,
        Err(panic) => anyhow::Error::new(BridgeError::Panicked(panic_message(panic.as_ref()))),
    };
    let context = callback.context();
    tracing::debug!(
        correlation_id = callback.correlation_id(),
        kind = %context.kind(),
        origin,
        "operation interrupted: {:#}",
        failure
    );
    callback.interrupt(context, failure);
}

/// Synchronous lookups: same containment, answer returned directly.
pub(crate) fn guarded<T>(origin: &'static str, body: impl FnOnce() -> anyhow::Result<T>) -> Result<T, ErrorPayload> {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(failure)) => Err(translate(&failure, origin)),
        Err(panic) => {
            let failure = anyhow::Error::new(BridgeError::Panicked(panic_message(panic.as_ref())));
            Err(translate(&failure, origin))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic".to_string()
    }
}

//! Sinks: where envelopes leave the bridge.
//!
//! - [`HostEmitter`]: the host boundary channel. Deliveries from engine
//!   threads go through one outbox and a single drainer calls the host,
//!   so the host never sees two envelopes interleave. No lock is held
//!   while host code runs; a host callback may call back into the bridge.
//! - [`ChannelSink`]: tokio channel for hosts that drain events on their
//!   own loop (`native` feature).
//!
//! Registry subscribers are any [`EventSink`].

use crate::callback::Envelope;
use crate::core::value::HostValue;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives lifecycle envelopes. Called from whichever thread the engine
/// reports on.
pub trait EventSink: Send + Sync {
    fn deliver(&self, envelope: &Envelope);
}

/// Identity of a sink behind an `Arc`, ignoring vtable pointers.
pub(crate) fn same_sink(a: &Arc<dyn EventSink>, b: &Arc<dyn EventSink>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Deliver, containing a panicking sink so the remaining sinks and the
/// engine thread are unaffected.
pub(crate) fn deliver_guarded(sink: &dyn EventSink, envelope: &Envelope) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| sink.deliver(envelope))) {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!(
                correlation_id = %envelope.correlation_id,
                kind = %envelope.context.kind(),
                stage = envelope.stage().as_str(),
                "sink panicked during delivery"
            );
            false
        }
    }
}

type EmitFn = dyn Fn(HostValue) + Send + Sync;

#[derive(Default)]
struct Outbox {
    queue: VecDeque<HostValue>,
    draining: bool,
}

/// Serialized host callback
pub struct HostEmitter {
    emit: Box<EmitFn>,
    outbox: Mutex<Outbox>,
}

impl HostEmitter {
    pub fn new(emit: impl Fn(HostValue) + Send + Sync + 'static) -> Self {
        Self { emit: Box::new(emit), outbox: Mutex::new(Outbox::default()) }
    }

    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Runs on the one thread that claimed the outbox. Values queued while
    // the host callback runs, including from inside it, are picked up here.
    fn drain(&self) {
        loop {
            let next = {
                let mut outbox = self.outbox();
                match outbox.queue.pop_front() {
                    Some(value) => value,
                    None => {
                        outbox.draining = false;
                        return;
                    }
                }
            };
            if panic::catch_unwind(AssertUnwindSafe(|| (self.emit)(next))).is_err() {
                tracing::warn!("host callback panicked, continuing with queued envelopes");
            }
        }
    }
}

impl EventSink for HostEmitter {
    fn deliver(&self, envelope: &Envelope) {
        let value = envelope.to_host_value();
        {
            let mut outbox = self.outbox();
            outbox.queue.push_back(value);
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }
        self.drain();
    }
}

#[cfg(feature = "native")]
pub use channel::ChannelSink;

#[cfg(feature = "native")]
mod channel {
    use super::EventSink;
    use crate::callback::Envelope;
    use tokio::sync::mpsc;

    /// Forwards envelopes into an unbounded tokio channel
    #[derive(Clone)]
    pub struct ChannelSink {
        tx: mpsc::UnboundedSender<Envelope>,
    }

    impl ChannelSink {
        pub fn new() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Self { tx }, rx)
        }
    }

    impl EventSink for ChannelSink {
        fn deliver(&self, envelope: &Envelope) {
            if self.tx.send(envelope.clone()).is_err() {
                tracing::debug!(correlation_id = %envelope.correlation_id, "channel receiver closed, dropping envelope");
            }
        }
    }
}

//! Correlation registry: correlation id -> subscribers awaiting its events.
//!
//! Process-wide, created once with [`CorrelationRegistry::init_global`]
//! and never torn down. One mutex guards the whole map, so subscribe,
//! unsubscribe and publish on the same id never interleave. Publish
//! snapshots the subscriber list under the lock and delivers outside it,
//! so a subscriber may unsubscribe from inside its own delivery.
//!
//! # Contract
//!
//! | Call | Behavior |
//! |------|----------|
//! | `subscribe(id, sink)` | appends; the same sink twice gets every event twice |
//! | `unsubscribe(id, sink)` | removes one association; unknown pair is a no-op |
//! | `publish(id, envelope)` | delivers in registration order; no subscribers = dropped, no replay |
//! | `open(id)` / `release(id)` | fan-out operation in flight for `id` |
//!
//! Entries go away once nobody is subscribed and nothing is in flight.
//! There is no expiry: a caller that never unsubscribes keeps its entry.

use crate::callback::Envelope;
use crate::sink::{deliver_guarded, same_sink, EventSink};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static GLOBAL: OnceCell<Arc<CorrelationRegistry>> = OnceCell::new();

#[derive(Default)]
struct Entry {
    subscribers: Vec<Arc<dyn EventSink>>,
    in_flight: bool,
}

impl Entry {
    fn is_idle(&self) -> bool {
        self.subscribers.is_empty() && !self.in_flight
    }
}

#[derive(Default)]
pub struct CorrelationRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the process-wide registry. Idempotent.
    pub fn init_global() -> Arc<CorrelationRegistry> {
        GLOBAL
            .get_or_init(|| {
                tracing::info!("correlation registry initialized");
                Arc::new(CorrelationRegistry::new())
            })
            .clone()
    }

    /// The process-wide registry, if initialized
    pub fn global() -> Option<Arc<CorrelationRegistry>> {
        GLOBAL.get().cloned()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, id: &str, sink: Arc<dyn EventSink>) {
        let mut entries = self.entries();
        let entry = entries.entry(id.to_string()).or_default();
        entry.subscribers.push(sink);
        tracing::debug!(correlation_id = id, subscribers = entry.subscribers.len(), "subscribed");
    }

    /// Remove one association. Returns whether one was found.
    pub fn unsubscribe(&self, id: &str, sink: &Arc<dyn EventSink>) -> bool {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(id) else { return false };
        let Some(pos) = entry.subscribers.iter().position(|s| same_sink(s, sink)) else { return false };
        entry.subscribers.remove(pos);
        if entry.is_idle() {
            entries.remove(id);
        }
        tracing::debug!(correlation_id = id, "unsubscribed");
        true
    }

    /// Deliver to every current subscriber of `id`, in registration order.
    /// Returns the number of subscribers reached.
    pub fn publish(&self, id: &str, envelope: &Envelope) -> usize {
        let subscribers = match self.entries().get(id) {
            Some(entry) => entry.subscribers.clone(),
            None => {
                tracing::warn!(correlation_id = id, stage = envelope.stage().as_str(), "publish to unknown correlation id dropped");
                return 0;
            }
        };
        if subscribers.is_empty() {
            tracing::debug!(correlation_id = id, stage = envelope.stage().as_str(), "no subscribers, event dropped");
        }
        subscribers.iter().filter(|sink| deliver_guarded(&***sink, envelope)).count()
    }

    pub(crate) fn open(&self, id: &str) {
        self.entries().entry(id.to_string()).or_default().in_flight = true;
    }

    pub(crate) fn release(&self, id: &str) {
        let mut entries = self.entries();
        if let Some(entry) = entries.get_mut(id) {
            entry.in_flight = false;
            if entry.is_idle() {
                entries.remove(id);
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries().contains_key(id)
    }

    pub fn subscriber_count(&self, id: &str) -> usize {
        self.entries().get(id).map(|e| e.subscribers.len()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{Event, Stage};
    use crate::core::{HostValue, OperationContext, OperationKind};
    use std::thread;

    #[derive(Default)]
    struct Tally {
        name: &'static str,
        log: Option<Arc<Mutex<Vec<&'static str>>>>,
        seen: Mutex<Vec<i64>>,
    }

    impl EventSink for Tally {
        fn deliver(&self, envelope: &Envelope) {
            if let Some(n) = envelope.data().and_then(HostValue::as_i64) {
                self.seen.lock().unwrap().push(n);
            }
            if let Some(log) = &self.log {
                log.lock().unwrap().push(self.name);
            }
        }
    }

    fn progress(n: i64) -> Envelope {
        Envelope {
            context: OperationContext::new(OperationKind::RevokeDevice),
            correlation_id: "c".into(),
            event: Event::Progress { step: "s".into(), data: HostValue::Int(n) },
        }
    }

    fn as_sink(t: &Arc<Tally>) -> Arc<dyn EventSink> {
        t.clone()
    }

    #[test]
    fn test_publish_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = CorrelationRegistry::new();
        for name in ["first", "second", "third"] {
            registry.subscribe("c", Arc::new(Tally { name, log: Some(log.clone()), ..Default::default() }));
        }
        assert_eq!(registry.publish("c", &progress(1)), 3);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_double_subscribe_delivers_twice() {
        let registry = CorrelationRegistry::new();
        let tally = Arc::new(Tally::default());
        registry.subscribe("c", as_sink(&tally));
        registry.subscribe("c", as_sink(&tally));
        registry.publish("c", &progress(5));
        assert_eq!(*tally.seen.lock().unwrap(), vec![5, 5]);

        // one unsubscribe removes one association
        assert!(registry.unsubscribe("c", &as_sink(&tally)));
        registry.publish("c", &progress(6));
        assert_eq!(*tally.seen.lock().unwrap(), vec![5, 5, 6]);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let registry = CorrelationRegistry::new();
        let tally = Arc::new(Tally::default());
        assert!(!registry.unsubscribe("missing", &as_sink(&tally)));
        registry.subscribe("c", Arc::new(Tally::default()));
        assert!(!registry.unsubscribe("c", &as_sink(&tally)));
        assert_eq!(registry.subscriber_count("c"), 1);
    }

    #[test]
    fn test_no_replay_for_late_subscriber() {
        let registry = CorrelationRegistry::new();
        registry.open("c");
        assert_eq!(registry.publish("c", &progress(1)), 0);
        let late = Arc::new(Tally::default());
        registry.subscribe("c", as_sink(&late));
        registry.publish("c", &progress(2));
        assert_eq!(*late.seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_publish_unknown_id_dropped() {
        let registry = CorrelationRegistry::new();
        assert_eq!(registry.publish("ghost", &progress(1)), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_entry_lifecycle() {
        let registry = CorrelationRegistry::new();
        let tally = Arc::new(Tally::default());
        registry.open("c");
        registry.subscribe("c", as_sink(&tally));
        registry.release("c");
        assert!(registry.contains("c"));
        registry.unsubscribe("c", &as_sink(&tally));
        assert!(!registry.contains("c"));

        registry.open("d");
        registry.release("d");
        assert!(registry.is_empty());
        registry.release("never-opened");
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_unsubscribe_from_inside_delivery() {
        struct SelfRemoving {
            registry: Arc<CorrelationRegistry>,
            me: Mutex<Option<Arc<dyn EventSink>>>,
            hits: Mutex<usize>,
        }
        impl EventSink for SelfRemoving {
            fn deliver(&self, _: &Envelope) {
                *self.hits.lock().unwrap() += 1;
                if let Some(me) = self.me.lock().unwrap().take() {
                    self.registry.unsubscribe("c", &me);
                }
            }
        }
        let registry = Arc::new(CorrelationRegistry::new());
        let sink = Arc::new(SelfRemoving { registry: registry.clone(), me: Mutex::new(None), hits: Mutex::new(0) });
        let dyn_sink: Arc<dyn EventSink> = sink.clone();
        *sink.me.lock().unwrap() = Some(dyn_sink.clone());
        registry.subscribe("c", dyn_sink);
        registry.publish("c", &progress(1));
        registry.publish("c", &progress(2));
        assert_eq!(*sink.hits.lock().unwrap(), 1);
        assert!(!registry.contains("c"));
    }

    #[test]
    fn test_concurrent_subscribe_unsubscribe_publish() {
        let registry = Arc::new(CorrelationRegistry::new());
        registry.open("c");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for n in 0..100 {
                        let tally = Arc::new(Tally::default());
                        registry.subscribe("c", as_sink(&tally));
                        registry.publish("c", &progress(n));
                        assert!(registry.unsubscribe("c", &as_sink(&tally)));
                        // own subscription was live during its own publish
                        assert!(tally.seen.lock().unwrap().contains(&n));
                    }
                })
            })
            .collect();
        for h in handles { h.join().unwrap(); }
        assert_eq!(registry.subscriber_count("c"), 0);
        registry.release("c");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_global_is_initialized_once() {
        let a = CorrelationRegistry::init_global();
        let b = CorrelationRegistry::init_global();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &CorrelationRegistry::global().unwrap()));
    }

    #[test]
    fn test_stage_of_published_envelope_untouched() {
        let registry = CorrelationRegistry::new();
        registry.subscribe("c", Arc::new(Tally::default()));
        let envelope = progress(3);
        registry.publish("c", &envelope);
        assert_eq!(envelope.stage(), Stage::Progress);
    }
}

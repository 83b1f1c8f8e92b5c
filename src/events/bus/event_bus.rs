// events/bus/event_bus.rs
//
// Core event bus implementation.
//
// DESIGN PRINCIPLES:
// 1. Synchronous - handlers execute immediately in subscription order
// 2. Deterministic - same events → same result
// 3. Observable - every emission is logged
// 4. Type-safe - events are strongly typed
// 5. No magic - explicit, straightforward code
//
// Synchronous execution is what makes change propagation airtight: the
// reconciliation handler finishes before the mutating call returns, so
// a unify that follows a mutation never sees a stale priority table.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::events::types::DomainEvent;

/// Type-erased handler; the concrete event type is recovered inside
type BoxedHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// The Event Bus
///
/// Central coordination point for all domain events. Mutation services
/// emit facts; the reconciliation handler (and any other subscriber)
/// reacts without a direct dependency on the emitter.
///
/// Key characteristics:
/// - Synchronous execution (no async, no threads)
/// - Handlers execute in subscription order
/// - Type-safe through generics
/// - Observable through logging
pub struct EventBus {
    /// Registered handlers per event TypeId, in subscription order
    registry: Arc<RwLock<HashMap<TypeId, Vec<BoxedHandler>>>>,

    /// Every emission, for debugging and tests
    event_log: Arc<RwLock<Vec<EventLogEntry>>>,
}

/// A logged event for debugging and tracing
#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub event_type: String,
    pub event_id: String,
    pub occurred_at: String,
    pub handler_count: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            event_log: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Subscribe to a specific event type
    ///
    /// Handlers are executed in the order they are subscribed.
    ///
    /// Example:
    /// ```ignore
    /// bus.subscribe::<MirrorAttached, _>(|event| {
    ///     println!("Mirror attached: {}", event.fonte);
    /// });
    /// ```
    pub fn subscribe<E, F>(&self, handler: F)
    where
        E: DomainEvent + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: BoxedHandler = Arc::new(move |any: &dyn Any| {
            match any.downcast_ref::<E>() {
                Some(event) => handler(event),
                None => eprintln!(
                    "ERROR: event downcast failed for {}",
                    std::any::type_name::<E>()
                ),
            }
        });

        self.registry
            .write()
            .unwrap()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// Emit an event and return only after every handler ran
    ///
    /// The handler list is snapshotted before execution and the
    /// registry lock released, so a handler may emit further events
    /// (the reconciliation handler does) or subscribe. A panicking
    /// handler is isolated; the remaining handlers still run.
    pub fn emit<E>(&self, event: E)
    where
        E: DomainEvent + 'static,
    {
        let snapshot: Vec<BoxedHandler> = self
            .registry
            .read()
            .unwrap()
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();

        let entry = EventLogEntry {
            event_type: event.event_type().to_string(),
            event_id: event.event_id().to_string(),
            occurred_at: event.occurred_at().to_rfc3339(),
            handler_count: snapshot.len(),
        };

        // Log to console (observable behavior)
        println!(
            "[EVENT] {} (id: {}) | {} handlers",
            entry.event_type, entry.event_id, entry.handler_count
        );
        self.event_log.write().unwrap().push(entry);

        for (idx, handler) in snapshot.iter().enumerate() {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(&event as &dyn Any);
            }));
            if outcome.is_err() {
                eprintln!(
                    "ERROR: handler {} for {} panicked",
                    idx,
                    event.event_type()
                );
            }
        }
    }

    /// Get the event log (for debugging)
    pub fn get_event_log(&self) -> Vec<EventLogEntry> {
        self.event_log.read().unwrap().clone()
    }

    /// Clear the event log
    pub fn clear_event_log(&self) {
        self.event_log.write().unwrap().clear();
    }

    /// Number of subscribers for a specific event type
    pub fn subscriber_count<E>(&self) -> usize
    where
        E: 'static,
    {
        self.registry
            .read()
            .unwrap()
            .get(&TypeId::of::<E>())
            .map_or(0, |h| h.len())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// Make EventBus cloneable (shared reference)
impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            event_log: Arc::clone(&self.event_log),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn test_subscribe_and_emit() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        bus.subscribe::<WorkCreated, _>(move |_event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        let event = WorkCreated::new(
            Uuid::new_v4(),
            "Berserk".to_string(),
            "mangasee".to_string(),
        );

        bus.emit(event);

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_multiple_handlers_execute_in_order() {
        let bus = EventBus::new();
        let sequence = Arc::new(RwLock::new(Vec::new()));

        let seq1 = Arc::clone(&sequence);
        bus.subscribe::<MirrorAttached, _>(move |_| {
            seq1.write().unwrap().push(1);
        });

        let seq2 = Arc::clone(&sequence);
        bus.subscribe::<MirrorAttached, _>(move |_| {
            seq2.write().unwrap().push(2);
        });

        let seq3 = Arc::clone(&sequence);
        bus.subscribe::<MirrorAttached, _>(move |_| {
            seq3.write().unwrap().push(3);
        });

        let event = MirrorAttached::new(Uuid::new_v4(), Uuid::new_v4(), "mangadex".to_string());

        bus.emit(event);

        let result = sequence.read().unwrap();
        assert_eq!(*result, vec![1, 2, 3]);
    }

    #[test]
    fn test_event_log_records_emissions() {
        let bus = EventBus::new();

        let event1 = WorkCreated::new(
            Uuid::new_v4(),
            "Vagabond".to_string(),
            "mangasee".to_string(),
        );

        let event2 = EntitiesChanged::new(vec![EntityRef::Work(Uuid::new_v4())]);

        bus.emit(event1);
        bus.emit(event2);

        let log = bus.get_event_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].event_type, "WorkCreated");
        assert_eq!(log[1].event_type, "EntitiesChanged");
    }

    #[test]
    fn test_subscriber_count() {
        let bus = EventBus::new();

        assert_eq!(bus.subscriber_count::<WorkCreated>(), 0);

        bus.subscribe::<WorkCreated, _>(|_| {});
        assert_eq!(bus.subscriber_count::<WorkCreated>(), 1);

        bus.subscribe::<WorkCreated, _>(|_| {});
        assert_eq!(bus.subscriber_count::<WorkCreated>(), 2);

        // Different event type
        assert_eq!(bus.subscriber_count::<MirrorAttached>(), 0);
    }

    #[test]
    fn test_handler_panic_doesnt_break_bus() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        // First handler panics
        bus.subscribe::<WorkCreated, _>(|_| {
            panic!("Intentional panic");
        });

        // Second handler should still execute
        let counter_clone = Arc::clone(&counter);
        bus.subscribe::<WorkCreated, _>(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        let event = WorkCreated::new(Uuid::new_v4(), "Test".to_string(), "mangasee".to_string());

        bus.emit(event);

        // Second handler executed despite first one panicking
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_emit_from_within_handler() {
        // The reconciliation handler emits WorkReconciled while an
        // EntitiesChanged emission is still on the stack; the snapshot
        // taken by emit makes that re-entrancy safe
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        bus.subscribe::<EntitiesChanged, _>(move |_| {
            inner_bus.emit(WorkReconciled::new(Uuid::new_v4(), 1, 1));
        });

        let counter_clone = Arc::clone(&counter);
        bus.subscribe::<WorkReconciled, _>(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(EntitiesChanged::new(vec![EntityRef::Work(Uuid::new_v4())]));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(bus.get_event_log().len(), 2);
    }
}

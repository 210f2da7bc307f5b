// events/bus/event_bus.rs
//
// Synchronous notification bus for projection consumers.
//
// - Handlers run on the emitting thread, in subscription order
// - Handlers are invoked outside every bus lock, so a handler may subscribe
//   or emit in turn
// - A panicking handler is logged and skipped
// - The emission log keeps only the most recent entries

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::events::types::DomainEvent;

/// Emissions kept by `EventBus::new`
pub const DEFAULT_LOG_CAPACITY: usize = 256;

type Handler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Delivers container notifications to whoever re-projects them
///
/// Shared between services through an `Arc`.
pub struct EventBus {
    handlers: RwLock<HashMap<TypeId, Vec<Handler>>>,
    log: RwLock<VecDeque<EventLogEntry>>,
    log_capacity: usize,
}

/// One recorded emission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLogEntry {
    pub event_type: String,
    pub event_id: Uuid,
    pub container_id: Uuid,
    pub occurred_at: String,
    pub handler_count: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_log_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Bus that remembers at most `capacity` emissions; 0 turns the log off
    pub fn with_log_capacity(capacity: usize) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            log: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY))),
            log_capacity: capacity,
        }
    }

    /// Register a handler for one event type
    ///
    /// ```ignore
    /// bus.subscribe::<FranchiseEntriesChanged, _>(|event| {
    ///     refresh_rows(event.franchise_id, &event.change);
    /// });
    /// ```
    pub fn subscribe<E, F>(&self, handler: F)
    where
        E: DomainEvent + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |event: &dyn Any| match event.downcast_ref::<E>() {
            Some(event) => handler(event),
            None => log::error!(
                "[EVENT] Handler for {} received another event type",
                std::any::type_name::<E>()
            ),
        });

        write(&self.handlers)
            .entry(TypeId::of::<E>())
            .or_default()
            .push(handler);
    }

    /// Deliver an event to every handler subscribed to its type
    pub fn emit<E>(&self, event: E)
    where
        E: DomainEvent + 'static,
    {
        let handlers: Vec<Handler> = read(&self.handlers)
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();

        log::debug!(
            "[EVENT] {} for {} | {} handlers",
            event.event_type(),
            event.container_id(),
            handlers.len()
        );
        self.record(&event, handlers.len());

        for (index, handler) in handlers.iter().enumerate() {
            let delivered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(&event as &dyn Any)
            }));

            if let Err(panic) = delivered {
                log::error!(
                    "[EVENT] Handler {} for {} panicked: {:?}",
                    index,
                    event.event_type(),
                    panic
                );
            }
        }
    }

    fn record<E: DomainEvent>(&self, event: &E, handler_count: usize) {
        if self.log_capacity == 0 {
            return;
        }

        let mut log = write(&self.log);
        while log.len() >= self.log_capacity {
            log.pop_front();
        }
        log.push_back(EventLogEntry {
            event_type: event.event_type().to_string(),
            event_id: event.event_id(),
            container_id: event.container_id(),
            occurred_at: event.occurred_at().to_rfc3339(),
            handler_count,
        });
    }

    /// Recent emissions, oldest first
    pub fn get_event_log(&self) -> Vec<EventLogEntry> {
        read(&self.log).iter().cloned().collect()
    }

    /// Recent emissions about one franchise or series
    pub fn events_for(&self, container_id: Uuid) -> Vec<EventLogEntry> {
        read(&self.log)
            .iter()
            .filter(|entry| entry.container_id == container_id)
            .cloned()
            .collect()
    }

    pub fn clear_event_log(&self) {
        write(&self.log).clear();
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for marker in 1..=3 {
            let calls = Arc::clone(&calls);
            bus.subscribe::<ProjectionResorted, _>(move |_| {
                calls.lock().unwrap().push(marker);
            });
        }

        bus.emit(ProjectionResorted::new(Uuid::new_v4()));

        assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_handler_receives_change() {
        let bus = EventBus::new();
        let received = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&received);

        bus.subscribe::<FranchiseEntriesChanged, _>(move |event| {
            *sink.lock().unwrap() = Some(event.change.clone());
        });

        let child_id = Uuid::new_v4();
        bus.emit(FranchiseEntriesChanged::new(
            Uuid::new_v4(),
            ProjectionChange::Removed { child_id },
        ));

        assert_eq!(
            *received.lock().unwrap(),
            Some(ProjectionChange::Removed { child_id })
        );
    }

    #[test]
    fn test_other_event_types_are_not_delivered() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        bus.subscribe::<SeriesCreated, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        bus.emit(ContainerSaved::new(Uuid::new_v4()));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.get_event_log()[0].handler_count, 0);
    }

    #[test]
    fn test_handler_may_subscribe_while_handling() {
        let bus = Arc::new(EventBus::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        let inner_bus = Arc::clone(&bus);
        let inner_calls = Arc::clone(&late_calls);
        bus.subscribe::<FranchiseCreated, _>(move |_| {
            let calls = Arc::clone(&inner_calls);
            inner_bus.subscribe::<ContainerSaved, _>(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        });

        bus.emit(FranchiseCreated::new(Uuid::new_v4(), "Dune".to_string()));
        bus.emit(ContainerSaved::new(Uuid::new_v4()));

        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_log_keeps_only_recent_emissions() {
        let bus = EventBus::with_log_capacity(2);
        let franchise_id = Uuid::new_v4();

        bus.emit(FranchiseCreated::new(franchise_id, "Alien".to_string()));
        bus.emit(MergeDisplayNumbersToggled::new(franchise_id, true));
        bus.emit(ProjectionResorted::new(Uuid::new_v4()));

        let log = bus.get_event_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].event_type, "MergeDisplayNumbersToggled");
        assert_eq!(log[1].event_type, "ProjectionResorted");
        assert_eq!(bus.events_for(franchise_id).len(), 1);

        bus.clear_event_log();
        assert!(bus.get_event_log().is_empty());
    }

    #[test]
    fn test_zero_capacity_disables_the_log() {
        let bus = EventBus::with_log_capacity(0);
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        bus.subscribe::<ContainerSaved, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(ContainerSaved::new(Uuid::new_v4()));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(bus.get_event_log().is_empty());
    }

    #[test]
    fn test_panicking_handler_is_skipped() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        bus.subscribe::<ContainerSaved, _>(|_| panic!("handler failure"));
        let counter = Arc::clone(&count);
        bus.subscribe::<ContainerSaved, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(ContainerSaved::new(Uuid::new_v4()));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

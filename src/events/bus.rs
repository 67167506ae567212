//! Event Bus - central hub for cross-module communication
//!
//! The EventBus decouples the game core from its collaborators:
//! - The UI emits GuessSubmitted / AdvanceRoundRequested / RestartRequested
//! - Rounds emit RoundEnded, the Game emits RoundStarted and GameEnded
//! - Recorders (EventBuffer, SqliteEventLogger) watch every event
//!
//! Dispatch is synchronous and single-threaded. Events emitted while a
//! dispatch is running are queued and delivered, in order, once the current
//! event's listeners have all returned. The outermost `emit` does not return
//! until the queue is empty.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{error, trace};

use super::types::{BusEvent, EventKind, GameEvent};
use crate::constants::MAX_DISPATCH_CHAIN;

type Listener = Rc<dyn Fn(&GameEvent)>;

/// Handle returned by `on`/`on_any`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    /// None = every event
    kind: Option<EventKind>,
    listener: Listener,
}

#[derive(Default)]
struct BusInner {
    listeners: RefCell<Vec<Registration>>,
    pending: RefCell<VecDeque<GameEvent>>,
    dispatching: Cell<bool>,
    next_id: Cell<u64>,
    /// Total events delivered over the bus lifetime
    dispatched: Cell<u64>,
}

/// Central event bus for cross-module communication
///
/// Cloning the bus clones the handle; all clones share listeners and queue.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

/// Clears the dispatching flag even if a listener panics
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event type
    pub fn on<E: BusEvent>(&self, listener: impl Fn(&E) + 'static) -> ListenerId {
        self.register(
            Some(E::KIND),
            Rc::new(move |event: &GameEvent| {
                if let Some(payload) = E::from_event(event) {
                    listener(payload);
                }
            }),
        )
    }

    /// Register a listener for every event (recorders, loggers)
    pub fn on_any(&self, listener: impl Fn(&GameEvent) + 'static) -> ListenerId {
        self.register(None, Rc::new(listener))
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|reg| reg.id != id);
        listeners.len() != before
    }

    /// Emit a typed event
    pub fn emit<E: BusEvent>(&self, event: E) {
        self.emit_event(event.into_event());
    }

    /// Emit an already-wrapped event
    pub fn emit_event(&self, event: GameEvent) {
        self.inner.pending.borrow_mut().push_back(event);

        if self.inner.dispatching.get() {
            // An outer emit is draining the queue and will deliver this
            return;
        }
        self.inner.dispatching.set(true);
        let _guard = DispatchGuard(&self.inner.dispatching);

        let mut chain = 0usize;
        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };

            chain += 1;
            if chain > MAX_DISPATCH_CHAIN {
                let dropped = self.inner.pending.borrow().len() + 1;
                self.inner.pending.borrow_mut().clear();
                error!(
                    "Event chain exceeded {} dispatches (last: {}); dropped {} queued events",
                    MAX_DISPATCH_CHAIN,
                    event.name(),
                    dropped
                );
                break;
            }

            self.dispatch(&event);
        }
    }

    /// Number of listeners registered for a kind (including catch-all listeners)
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|reg| reg.kind.is_none_or(|k| k == kind))
            .count()
    }

    /// Total number of events delivered so far
    pub fn dispatched_count(&self) -> u64 {
        self.inner.dispatched.get()
    }

    /// Check if the bus is currently delivering an event
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.get()
    }

    fn register(&self, kind: Option<EventKind>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.listeners.borrow_mut().push(Registration { id, kind, listener });
        id
    }

    fn dispatch(&self, event: &GameEvent) {
        let kind = event.kind();
        // Snapshot so listeners can (un)subscribe while being called
        let targets: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|reg| reg.kind.is_none_or(|k| k == kind))
            .map(|reg| Rc::clone(&reg.listener))
            .collect();

        trace!("dispatch {} to {} listeners", kind, targets.len());
        self.inner.dispatched.set(self.inner.dispatched.get() + 1);

        for listener in targets {
            listener(event);
        }
    }
}

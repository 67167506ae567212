//! In-memory event recorder
//!
//! Records every event that crosses a bus, in delivery order. Used by the
//! scenario runner, the simulation and tests; the SQLite logger is the
//! persistent equivalent.

use std::cell::RefCell;
use std::rc::Rc;

use uuid::Uuid;

use super::bus::{EventBus, ListenerId};
use super::types::{EventKind, GameEvent};

#[derive(Default)]
struct BufferState {
    events: Vec<GameEvent>,
}

/// Shared handle to a recorded event stream
#[derive(Clone)]
pub struct EventBuffer {
    state: Rc<RefCell<BufferState>>,
    session_id: String,
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBuffer {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(BufferState::default())),
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a buffer already recording everything on `bus`
    pub fn attached(bus: &EventBus) -> Self {
        let buffer = Self::new();
        buffer.attach(bus);
        buffer
    }

    /// Start recording events from `bus`
    pub fn attach(&self, bus: &EventBus) -> ListenerId {
        let state = Rc::clone(&self.state);
        bus.on_any(move |event| state.borrow_mut().events.push(event.clone()))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Copy of all recorded events
    pub fn events(&self) -> Vec<GameEvent> {
        self.state.borrow().events.clone()
    }

    /// Recorded event kinds in order
    pub fn kinds(&self) -> Vec<EventKind> {
        self.state.borrow().events.iter().map(GameEvent::kind).collect()
    }

    /// Recorded wire names in order
    pub fn names(&self) -> Vec<&'static str> {
        self.state.borrow().events.iter().map(GameEvent::name).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|e| e.kind() == kind)
            .count()
    }

    pub fn last(&self) -> Option<GameEvent> {
        self.state.borrow().events.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// Take all recorded events, leaving the buffer empty
    pub fn drain(&self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::{AdvanceRoundRequested, RestartRequested};

    #[test]
    fn test_records_in_order() {
        let bus = EventBus::new();
        let buffer = EventBuffer::attached(&bus);

        bus.emit(RestartRequested);
        bus.emit(AdvanceRoundRequested);
        bus.emit(RestartRequested);

        assert_eq!(buffer.len(), 3);
        assert_eq!(
            buffer.names(),
            vec![
                "game:restart-requested",
                "round:advance-requested",
                "game:restart-requested"
            ]
        );
        assert_eq!(buffer.count(EventKind::RestartRequested), 2);
    }

    #[test]
    fn test_drain_empties_buffer() {
        let bus = EventBus::new();
        let buffer = EventBuffer::attached(&bus);
        bus.emit(RestartRequested);

        let drained = buffer.drain();
        assert_eq!(drained.len(), 1);
        assert!(buffer.is_empty());
        assert!(!buffer.session_id().is_empty());
    }
}

//! Event type definitions for the bus
//!
//! Each event name has exactly one payload struct. The `BusEvent` impls tie a
//! payload to its `EventKind`, so `bus.on::<RoundEnded>(..)` can only ever be
//! handed a `RoundEnded`.

use serde::{Deserialize, Serialize};

use crate::game::GameSummary;
use crate::geo::Coordinates;
use crate::round::RoundSummary;

/// Closed set of event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    GuessSubmitted,
    RoundStarted,
    RoundEnded,
    GameEnded,
    RestartRequested,
    AdvanceRoundRequested,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::GuessSubmitted,
        EventKind::RoundStarted,
        EventKind::RoundEnded,
        EventKind::GameEnded,
        EventKind::RestartRequested,
        EventKind::AdvanceRoundRequested,
    ];

    /// Wire name used in logs and scenario files
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::GuessSubmitted => "guess:submitted",
            EventKind::RoundStarted => "round:started",
            EventKind::RoundEnded => "round:ended",
            EventKind::GameEnded => "game:ended",
            EventKind::RestartRequested => "game:restart-requested",
            EventKind::AdvanceRoundRequested => "round:advance-requested",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Player submitted a guess location (UI -> Game)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuessSubmitted(pub Coordinates);

/// A round became active (Game -> UI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStarted {
    pub round: RoundSummary,
    /// Rounds in the current game
    pub round_count: usize,
}

/// A round completed; score and distance are set (Round -> UI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundEnded(pub RoundSummary);

/// Every round is completed; total score is final (Game -> UI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEnded(pub GameSummary);

/// Player asked for a fresh game (UI -> Game)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartRequested;

/// Player dismissed the round summary and wants the next round (UI -> Game)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceRoundRequested;

/// Any event travelling on the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameEvent {
    GuessSubmitted(GuessSubmitted),
    RoundStarted(RoundStarted),
    RoundEnded(RoundEnded),
    GameEnded(GameEnded),
    RestartRequested(RestartRequested),
    AdvanceRoundRequested(AdvanceRoundRequested),
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::GuessSubmitted(_) => EventKind::GuessSubmitted,
            GameEvent::RoundStarted(_) => EventKind::RoundStarted,
            GameEvent::RoundEnded(_) => EventKind::RoundEnded,
            GameEvent::GameEnded(_) => EventKind::GameEnded,
            GameEvent::RestartRequested(_) => EventKind::RestartRequested,
            GameEvent::AdvanceRoundRequested(_) => EventKind::AdvanceRoundRequested,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Payload as JSON (no enum wrapper), for persistence
    pub fn payload_json(&self) -> String {
        let value = match self {
            GameEvent::GuessSubmitted(e) => serde_json::to_value(e),
            GameEvent::RoundStarted(e) => serde_json::to_value(e),
            GameEvent::RoundEnded(e) => serde_json::to_value(e),
            GameEvent::GameEnded(e) => serde_json::to_value(e),
            GameEvent::RestartRequested(e) => serde_json::to_value(e),
            GameEvent::AdvanceRoundRequested(e) => serde_json::to_value(e),
        };
        value.map(|v| v.to_string()).unwrap_or_else(|_| "null".to_string())
    }
}

/// Payload type bound to a single event name
pub trait BusEvent: Sized + 'static {
    const KIND: EventKind;

    fn into_event(self) -> GameEvent;

    fn from_event(event: &GameEvent) -> Option<&Self>;
}

macro_rules! bus_event {
    ($payload:ident) => {
        impl BusEvent for $payload {
            const KIND: EventKind = EventKind::$payload;

            fn into_event(self) -> GameEvent {
                GameEvent::$payload(self)
            }

            fn from_event(event: &GameEvent) -> Option<&Self> {
                match event {
                    GameEvent::$payload(payload) => Some(payload),
                    _ => None,
                }
            }
        }

        impl From<$payload> for GameEvent {
            fn from(payload: $payload) -> Self {
                GameEvent::$payload(payload)
            }
        }
    };
}

bus_event!(GuessSubmitted);
bus_event!(RoundStarted);
bus_event!(RoundEnded);
bus_event!(GameEnded);
bus_event!(RestartRequested);
bus_event!(AdvanceRoundRequested);

//! Game event bus and recorders
//!
//! All components talk through the EventBus; nothing holds a reference to an
//! unrelated component. Recorders hook into the same bus to keep an
//! in-memory (EventBuffer) or SQLite (SqliteEventLogger) trail of every event.

mod bus;
mod logger;
mod sqlite_logger;
mod types;

pub use bus::{EventBus, ListenerId};
pub use logger::EventBuffer;
pub use sqlite_logger::SqliteEventLogger;
pub use types::{
    AdvanceRoundRequested, BusEvent, EventKind, GameEnded, GameEvent, GuessSubmitted,
    RestartRequested, RoundEnded, RoundStarted,
};

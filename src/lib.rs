//! Geoguess - find places on the map, one round at a time
//!
//! This crate provides the game core (rounds, scoring, the event bus) plus the
//! terminal front end, scenario runner and simulation tools built on it.

// Core modules
pub mod constants;
pub mod error;
pub mod events;
pub mod geo;
pub mod logging;
pub mod settings;

// Game logic modules
pub mod game;
pub mod locations;
pub mod round;
pub mod scoring;

// Tooling and front end
pub mod simulation;
pub mod testing;
pub mod ui;

// Re-export commonly used types for convenience
pub use constants::*;
pub use error::GameError;
pub use events::{
    AdvanceRoundRequested, BusEvent, EventBuffer, EventBus, EventKind, GameEnded, GameEvent,
    GuessSubmitted, ListenerId, RestartRequested, RoundEnded, RoundStarted, SqliteEventLogger,
};
pub use game::{Game, GameConfig, GamePhase, GameSummary};
pub use geo::{Coordinates, deg_to_rad, haversine_distance};
pub use locations::{LocationDatabase, LocationSource, PointOfInterest};
pub use logging::{LogConfig, init_logging};
pub use round::{Round, RoundOutcome, RoundStatus, RoundSummary};
pub use scoring::ScoringPolicy;
pub use settings::{CliAction, GameSettings};

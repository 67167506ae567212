//! Error taxonomy for the game core
//!
//! Every variant is a programmer-facing contract violation or a data problem
//! detected at construction time. A guess arriving while no round is active is
//! not an error and never shows up here.

use thiserror::Error;

use crate::game::GamePhase;
use crate::round::RoundStatus;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// A round was asked to make a transition its current status forbids
    #[error("cannot {action} round {index}: round is {status}")]
    InvalidRoundState {
        index: usize,
        action: &'static str,
        status: RoundStatus,
    },

    /// The game was asked to make a transition its current phase forbids
    #[error("cannot {action}: game is {phase}")]
    InvalidGameState {
        action: &'static str,
        phase: GamePhase,
    },

    /// More locations were requested than the source holds
    #[error("cannot retrieve {requested} locations: only {available} available")]
    NotEnoughLocations { requested: usize, available: usize },

    #[error("invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("invalid game config: {0}")]
    InvalidConfig(String),

    /// Location dataset could not be read or parsed
    #[error("failed to load locations from {path}: {reason}")]
    LocationData { path: String, reason: String },
}

impl GameError {
    /// True for errors raised by an out-of-order state transition
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            GameError::InvalidRoundState { .. } | GameError::InvalidGameState { .. }
        )
    }
}

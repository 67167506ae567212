//! Simulation module - headless games with scripted players
//!
//! Plays many games without a terminal and aggregates the scores, to see
//! how a scoring policy treats a given kind of player.

pub mod config;
pub mod metrics;
pub mod parallel;
pub mod runner;

pub use config::{GuessStrategy, SimConfig};
pub use metrics::{DistanceBand, GameResult, SimMetrics};
pub use runner::{Guesser, run_game, run_simulation};

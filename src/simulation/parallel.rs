//! Parallel simulation execution
//!
//! Uses Rayon to play many games concurrently. Each game owns its bus and
//! game state, so nothing is shared between workers except the location pool.

use rayon::prelude::*;
use std::sync::Arc;
use tracing::warn;

use crate::error::GameError;
use crate::locations::LocationDatabase;

use super::config::SimConfig;
use super::metrics::GameResult;
use super::runner::run_game;

/// Initialize the global thread pool (0 = rayon's default).
/// Call once at startup; later calls keep the existing pool.
pub fn init_parallel(threads: usize) {
    if threads > 0
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        warn!("Could not configure {} worker threads: {}", threads, e);
    }
}

/// Play one game per seed in parallel.
///
/// Returns results in the same order as `seeds`.
pub fn run_games_parallel(
    config: &SimConfig,
    locations: &Arc<LocationDatabase>,
    seeds: &[u64],
) -> Vec<Result<GameResult, GameError>> {
    seeds
        .par_iter()
        .map(|&seed| run_game(config, locations, seed))
        .collect()
}

//! Headless game runner
//!
//! Plays a game the way the terminal front end would: a scripted player
//! picks a guess for the current round and sends it on the bus, then asks
//! for the next round. The final score comes from the GameEnded event.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;
use tracing::warn;

use crate::constants::{MAX_LATITUDE, METERS_PER_DEGREE_LAT, MIN_LATITUDE};
use crate::error::GameError;
use crate::events::{AdvanceRoundRequested, EventBus, GameEnded, GuessSubmitted};
use crate::game::{Game, GameSummary};
use crate::geo::Coordinates;
use crate::locations::{LocationDatabase, LocationSource};

use super::config::{GuessStrategy, SimConfig};
use super::metrics::{GameResult, SimMetrics};
use super::parallel::{init_parallel, run_games_parallel};

/// Scripted player
pub struct Guesser {
    strategy: GuessStrategy,
    /// South-west and north-east corners of the pool
    bounds: Option<(Coordinates, Coordinates)>,
    rng: StdRng,
}

impl Guesser {
    pub fn new(strategy: GuessStrategy, bounds: Option<(Coordinates, Coordinates)>, seed: u64) -> Self {
        Self {
            strategy,
            bounds,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn guess(&mut self, target: Coordinates) -> Coordinates {
        match self.strategy {
            GuessStrategy::Exact => target,
            GuessStrategy::Jitter { meters } => {
                // sqrt keeps the points uniform over the disc
                let distance = meters * self.rng.r#gen::<f64>().sqrt();
                let bearing = self.rng.gen_range(0.0..std::f64::consts::TAU);
                offset(target, distance * bearing.cos(), distance * bearing.sin())
            }
            GuessStrategy::Uniform => match self.bounds {
                Some((sw, ne)) => Coordinates {
                    lat: sample_between(&mut self.rng, sw.lat, ne.lat),
                    lng: sample_between(&mut self.rng, sw.lng, ne.lng),
                },
                None => target,
            },
        }
    }
}

fn sample_between(rng: &mut StdRng, low: f64, high: f64) -> f64 {
    if high > low { rng.gen_range(low..=high) } else { low }
}

/// Move `north_m` / `east_m` metres on a local flat approximation
fn offset(from: Coordinates, north_m: f64, east_m: f64) -> Coordinates {
    let lat = (from.lat + north_m / METERS_PER_DEGREE_LAT).clamp(MIN_LATITUDE, MAX_LATITUDE);
    let cos_lat = from.lat.to_radians().cos().max(1e-6);
    let mut lng = from.lng + east_m / (METERS_PER_DEGREE_LAT * cos_lat);
    if lng > 180.0 {
        lng -= 360.0;
    } else if lng < -180.0 {
        lng += 360.0;
    }
    Coordinates { lat, lng }
}

/// Guesser seed derived from the game seed so the two streams differ
fn guesser_seed(game_seed: u64) -> u64 {
    game_seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ 0x5DEE_CE66
}

/// Play one full game and return its result
pub fn run_game(config: &SimConfig, locations: &Arc<LocationDatabase>, seed: u64) -> Result<GameResult, GameError> {
    let bus = EventBus::new();

    let final_summary: Rc<RefCell<Option<GameSummary>>> = Rc::new(RefCell::new(None));
    let sink = final_summary.clone();
    bus.on::<GameEnded>(move |event| {
        *sink.borrow_mut() = Some(event.0.clone());
    });

    let source: Arc<dyn LocationSource> = locations.clone();
    let game = Game::install(&bus, source, config.game_config(seed))?;
    let mut guesser = Guesser::new(config.strategy, locations.bounds(), guesser_seed(seed));

    for _ in 0..config.round_count {
        let target = game.borrow().current_round().map(|round| round.target());
        let Some(target) = target else {
            break;
        };
        bus.emit(GuessSubmitted(guesser.guess(target)));
        bus.emit(AdvanceRoundRequested);
    }

    let summary = final_summary.borrow_mut().take();
    match summary {
        Some(summary) => Ok(GameResult::from_summary(seed, &summary)),
        None => {
            let phase = game.borrow().phase();
            Err(GameError::InvalidGameState {
                action: "finish the simulated game",
                phase,
            })
        }
    }
}

/// Main simulation entry point
pub fn run_simulation(config: SimConfig) {
    let locations = Arc::new(LocationDatabase::load_from_file(&config.locations_file));
    let base_seed = config.seed.unwrap_or_else(|| rand::thread_rng().r#gen());

    if !config.quiet {
        eprintln!(
            "Running {} games: {} rounds, {} scoring, {} guesser, {} locations (seed: {})",
            config.games,
            config.round_count,
            config.scoring.name(),
            config.strategy.label(),
            locations.len(),
            base_seed
        );
    }

    init_parallel(config.parallel);
    let seeds: Vec<u64> = (0..config.games as u64).map(|i| base_seed.wrapping_add(i)).collect();
    let outcomes = run_games_parallel(&config, &locations, &seeds);

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failed = 0;
    for (seed, outcome) in seeds.iter().zip(outcomes) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!("Game with seed {} failed: {}", seed, e);
                failed += 1;
            }
        }
    }

    let metrics = SimMetrics::from_results(&config, &results, failed);
    output_metrics(&metrics, &config);
}

fn output_metrics(metrics: &SimMetrics, config: &SimConfig) {
    let json = match serde_json::to_string_pretty(metrics) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize metrics: {}", e);
            return;
        }
    };

    match &config.output_file {
        Some(path) => match std::fs::File::create(path).and_then(|mut f| f.write_all(json.as_bytes())) {
            Ok(()) => {
                if !config.quiet {
                    eprintln!("Results written to {}", path);
                }
            }
            Err(e) => eprintln!("Failed to write {}: {}", path, e),
        },
        None => println!("{}", json),
    }
}

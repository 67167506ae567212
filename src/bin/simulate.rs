//! Simulation Tool - headless games with a scripted guesser
//!
//! Plays many games without a terminal and prints aggregate score metrics.
//!
//! Usage:
//!   cargo run --bin simulate -- --help
//!   cargo run --bin simulate -- --strategy exact --games 10
//!   cargo run --bin simulate -- --jitter 2000 --scoring exponential --seed 1

use geoguess::logging::{LogConfig, init_logging};
use geoguess::simulation::{SimConfig, run_simulation};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    init_logging(&LogConfig::load_with_args(&args));

    let config = SimConfig::from_args();
    run_simulation(config);
}

//! Persistent game settings
//!
//! Loads round count, scoring policy and data paths from JSON, then applies
//! command line overrides.
//! Priority: local settings > template settings > built-in defaults > CLI args on top.

use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

use crate::constants::{DEFAULT_ROUND_COUNT, LOCATIONS_FILE};
use crate::game::GameConfig;
use crate::scoring::ScoringPolicy;

/// Template settings (checked into git)
pub const SETTINGS_TEMPLATE: &str = "config/game_settings.template.json";
/// Local settings (gitignored, user's custom settings)
pub const SETTINGS_FILE: &str = "config/game_settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Rounds per game
    pub round_count: usize,
    pub scoring: ScoringPolicy,
    /// GeoJSON file with the point-of-interest pool
    pub locations_file: String,
    /// RNG seed for reproducible games (None = random)
    pub seed: Option<u64>,
    /// SQLite database for the event log (None = no persistence)
    pub event_db: Option<String>,
    /// Force debug-level logging
    pub debug_log: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            round_count: DEFAULT_ROUND_COUNT,
            scoring: ScoringPolicy::Threshold,
            locations_file: LOCATIONS_FILE.to_string(),
            seed: None,
            event_db: None,
            debug_log: false,
        }
    }
}

/// What the command line asked for besides settings
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    Play(GameSettings),
    Help,
}

impl GameSettings {
    /// Load settings from a JSON file
    pub fn from_file(path: &str) -> Result<Self, String> {
        let contents =
            fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
    }

    /// Load settings from the default config files
    pub fn from_config_files() -> Self {
        if let Ok(settings) = Self::from_file(SETTINGS_FILE) {
            info!("Loaded settings from {}", SETTINGS_FILE);
            return settings;
        }
        if let Ok(settings) = Self::from_file(SETTINGS_TEMPLATE) {
            info!("Loaded settings from {}", SETTINGS_TEMPLATE);
            return settings;
        }
        Self::default()
    }

    /// Apply command line overrides to `base`. `args[0]` is the program name.
    pub fn parse_args(base: Self, args: &[String]) -> CliAction {
        let mut settings = base;

        // Explicit settings file replaces the base before other overrides
        if let Some(pos) = args.iter().position(|a| a == "--settings")
            && let Some(path) = args.get(pos + 1)
        {
            match Self::from_file(path) {
                Ok(loaded) => settings = loaded,
                Err(e) => eprintln!("Warning: {}", e),
            }
        }

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--settings" => {
                    // Already handled above
                    i += 1;
                }
                "--rounds" => {
                    if i + 1 < args.len() {
                        settings.round_count = args[i + 1].parse().unwrap_or(settings.round_count);
                        i += 1;
                    }
                }
                "--seed" => {
                    if i + 1 < args.len() {
                        settings.seed = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                "--locations" => {
                    if i + 1 < args.len() {
                        settings.locations_file = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--scoring" => {
                    if i + 1 < args.len() {
                        match ScoringPolicy::from_name(&args[i + 1]) {
                            Some(policy) => settings.scoring = policy,
                            None => eprintln!("Warning: unknown scoring policy '{}'", args[i + 1]),
                        }
                        i += 1;
                    }
                }
                "--db" => {
                    if i + 1 < args.len() {
                        settings.event_db = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--debug-log" => {
                    settings.debug_log = true;
                }
                "--help" | "-h" => return CliAction::Help,
                _ => {}
            }
            i += 1;
        }

        CliAction::Play(settings)
    }

    /// Per-game part of the settings
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            round_count: self.round_count,
            scoring: self.scoring,
            seed: self.seed,
        }
    }
}

pub fn print_help() {
    println!(
        r#"geoguess - find places on the map, one round at a time

USAGE:
    cargo run -- [OPTIONS]

OPTIONS:
    --settings <FILE>    Load settings from JSON file (CLI args override file settings)
    --rounds <N>         Rounds per game (default: {rounds})
    --seed <N>           RNG seed for reproducible games
    --locations <FILE>   GeoJSON point collection (default: {locations})
    --scoring <POLICY>   threshold | exponential (default: threshold)
    --db <FILE>          Log every game event to a SQLite database
    --debug-log          Verbose logging to stderr
    --help, -h           Show this help

IN GAME:
    <lat> <lng>          Guess a location, e.g. "48.85 2.35"
    next                 Go to the next round
    restart              Start a new game (after the last round)
    score                Show the running total
    quit                 Leave
"#,
        rounds = DEFAULT_ROUND_COUNT,
        locations = LOCATIONS_FILE,
    );
}

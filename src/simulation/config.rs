//! Simulation configuration

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ROUND_COUNT, LOCATIONS_FILE};
use crate::game::GameConfig;
use crate::scoring::ScoringPolicy;

/// How the scripted player picks its guess
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuessStrategy {
    /// Always the target itself
    Exact,
    /// Uniform point within `meters` of the target
    Jitter { meters: f64 },
    /// Uniform point in the pool's bounding box
    #[default]
    Uniform,
}

impl GuessStrategy {
    /// Parse "exact", "uniform", "jitter" (1 km) or "jitter:<meters>"
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "exact" => Some(GuessStrategy::Exact),
            "uniform" | "random" => Some(GuessStrategy::Uniform),
            "jitter" => Some(GuessStrategy::Jitter { meters: 1_000.0 }),
            _ => {
                let meters: f64 = name.strip_prefix("jitter:")?.parse().ok()?;
                (meters >= 0.0).then_some(GuessStrategy::Jitter { meters })
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            GuessStrategy::Exact => "exact".to_string(),
            GuessStrategy::Jitter { meters } => format!("jitter:{}", meters),
            GuessStrategy::Uniform => "uniform".to_string(),
        }
    }
}

/// Configuration for a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of games to play
    pub games: u32,
    pub round_count: usize,
    pub scoring: ScoringPolicy,
    pub strategy: GuessStrategy,
    /// GeoJSON point collection
    pub locations_file: String,
    /// Base RNG seed; game i uses seed + i (None = random)
    pub seed: Option<u64>,
    /// Output file path (None = stdout)
    pub output_file: Option<String>,
    /// Suppress progress output
    pub quiet: bool,
    /// Number of parallel threads (0 = rayon default)
    pub parallel: usize,
    #[serde(skip)]
    pub show_help: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            games: 100,
            round_count: DEFAULT_ROUND_COUNT,
            scoring: ScoringPolicy::Threshold,
            strategy: GuessStrategy::Uniform,
            locations_file: LOCATIONS_FILE.to_string(),
            seed: None,
            output_file: None,
            quiet: false,
            parallel: 0,
            show_help: false,
        }
    }
}

/// Template simulation settings (checked into git)
pub const SIM_SETTINGS_TEMPLATE: &str = "config/simulation_settings.template.json";
/// Local simulation settings (gitignored, user's custom settings)
pub const SIM_SETTINGS_FILE: &str = "config/simulation_settings.json";

impl SimConfig {
    /// Load configuration from a JSON settings file
    pub fn from_file(path: &str) -> Result<Self, String> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
    }

    /// Priority: local settings > template settings > built-in defaults
    pub fn from_config_files() -> Self {
        if let Ok(config) = Self::from_file(SIM_SETTINGS_FILE) {
            return config;
        }
        if let Ok(config) = Self::from_file(SIM_SETTINGS_TEMPLATE) {
            return config;
        }
        Self::default()
    }

    /// Parse configuration from command line arguments
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let config = Self::parse_args(Self::from_config_files(), &args);
        if config.show_help {
            print_help();
            std::process::exit(0);
        }
        config
    }

    /// Apply command line overrides to `base`. `args[0]` is the program name.
    pub fn parse_args(base: Self, args: &[String]) -> Self {
        let mut config = base;

        if let Some(pos) = args.iter().position(|a| a == "--settings")
            && let Some(path) = args.get(pos + 1)
        {
            match Self::from_file(path) {
                Ok(loaded) => config = loaded,
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
                "--games" => {
                    if i + 1 < args.len() {
                        config.games = args[i + 1].parse().unwrap_or(config.games);
                        i += 1;
                    }
                }
                "--rounds" => {
                    if i + 1 < args.len() {
                        config.round_count = args[i + 1].parse().unwrap_or(config.round_count);
                        i += 1;
                    }
                }
                "--scoring" => {
                    if i + 1 < args.len() {
                        match ScoringPolicy::from_name(&args[i + 1]) {
                            Some(policy) => config.scoring = policy,
                            None => eprintln!("Warning: unknown scoring policy '{}'", args[i + 1]),
                        }
                        i += 1;
                    }
                }
                "--strategy" => {
                    if i + 1 < args.len() {
                        match GuessStrategy::from_name(&args[i + 1]) {
                            Some(strategy) => config.strategy = strategy,
                            None => eprintln!("Warning: unknown strategy '{}'", args[i + 1]),
                        }
                        i += 1;
                    }
                }
                "--jitter" => {
                    if i + 1 < args.len() {
                        if let Ok(meters) = args[i + 1].parse::<f64>() {
                            config.strategy = GuessStrategy::Jitter { meters: meters.abs() };
                        }
                        i += 1;
                    }
                }
                "--locations" => {
                    if i + 1 < args.len() {
                        config.locations_file = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--seed" => {
                    if i + 1 < args.len() {
                        config.seed = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                "--output" => {
                    if i + 1 < args.len() {
                        config.output_file = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--quiet" | "-q" => {
                    config.quiet = true;
                }
                "--parallel" => {
                    if i + 1 < args.len() {
                        config.parallel = args[i + 1].parse().unwrap_or(0);
                        i += 1;
                    }
                }
                "--help" | "-h" => {
                    config.show_help = true;
                }
                _ => {}
            }
            i += 1;
        }

        config
    }

    /// Game settings for the game played with `seed`
    pub fn game_config(&self, seed: u64) -> GameConfig {
        GameConfig {
            round_count: self.round_count,
            scoring: self.scoring,
            seed: Some(seed),
        }
    }
}

fn print_help() {
    println!(
        r#"Headless game simulation - scripted players, aggregate scores

USAGE:
    cargo run --bin simulate -- [OPTIONS]

OPTIONS:
    --settings <FILE>    Load settings from JSON file (CLI args override file settings)
    --games <N>          Number of games (default: 100)
    --rounds <N>         Rounds per game (default: {rounds})
    --scoring <POLICY>   threshold | exponential (default: threshold)
    --strategy <NAME>    exact | uniform | jitter | jitter:<meters> (default: uniform)
    --jitter <METERS>    Shorthand for --strategy jitter:<meters>
    --locations <FILE>   GeoJSON point collection (default: {locations})
    --seed <N>           Base RNG seed for reproducibility
    --output <FILE>      Output JSON to file (default: stdout)
    --quiet, -q          Suppress progress output
    --parallel <N>       Worker threads (default: all cores)
    --help, -h           Show this help

EXAMPLES:
    # How much does a 2 km miss cost on average?
    cargo run --bin simulate -- --jitter 2000 --games 500 --seed 1

    # Compare policies for random clicks
    cargo run --bin simulate -- --strategy uniform --scoring exponential
"#,
        rounds = DEFAULT_ROUND_COUNT,
        locations = LOCATIONS_FILE,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("simulate")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(GuessStrategy::from_name("exact"), Some(GuessStrategy::Exact));
        assert_eq!(GuessStrategy::from_name("Uniform"), Some(GuessStrategy::Uniform));
        assert_eq!(
            GuessStrategy::from_name("jitter:250"),
            Some(GuessStrategy::Jitter { meters: 250.0 })
        );
        assert_eq!(GuessStrategy::from_name("jitter:-5"), None);
        assert_eq!(GuessStrategy::from_name("psychic"), None);
    }

    #[test]
    fn test_cli_overrides() {
        let config = SimConfig::parse_args(
            SimConfig::default(),
            &args(&["--games", "12", "--jitter", "500", "--seed", "9", "--parallel", "2", "-q"]),
        );
        assert_eq!(config.games, 12);
        assert_eq!(config.strategy, GuessStrategy::Jitter { meters: 500.0 });
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.parallel, 2);
        assert!(config.quiet);
        assert!(!config.show_help);
        assert_eq!(config.game_config(9).seed, Some(9));
    }

    #[test]
    fn test_help_flag() {
        assert!(SimConfig::parse_args(SimConfig::default(), &args(&["--help"])).show_help);
    }
}

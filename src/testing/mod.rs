//! Scenario testing system for deterministic game testing
//!
//! Scenarios script a whole game (pool, config, player actions) in TOML and
//! check the resulting scores and event stream without a terminal.

use std::fs;
use std::path::{Path, PathBuf};

pub mod assertions;
pub mod parser;
pub mod runner;

pub use assertions::{AssertionError, check_outcome, check_sequence};
pub use parser::{PoolEntry, ScenarioDefinition, ScenarioExpectations, ScenarioSetup, Step, StepAction};
pub use runner::{TestResult, run_scenario};

/// Default path for test scenarios
pub const SCENARIOS_DIR: &str = "tests/scenarios";

/// Find `.toml` scenarios under `base`, sorted, keeping those whose path
/// relative to `base` contains `filter`
pub fn discover_scenarios(base: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut dirs = vec![base.to_path_buf()];

    while let Some(dir) = dirs.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                dirs.push(path);
                continue;
            }
            if path.extension().is_none_or(|ext| ext != "toml") {
                continue;
            }
            let rel = path.strip_prefix(base).unwrap_or(&path).to_string_lossy().to_string();
            if filter.is_none_or(|f| rel.contains(f)) {
                found.push(path);
            }
        }
    }

    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_scenarios_pass() {
        let scenarios = discover_scenarios(Path::new(SCENARIOS_DIR), None);
        assert!(!scenarios.is_empty());

        for path in scenarios {
            let scenario = parser::parse_scenario_file(&path).unwrap();
            let result = run_scenario(&scenario);
            assert!(result.is_pass(), "{}: {:?}", path.display(), result);
        }
    }

    #[test]
    fn test_filter() {
        let all = discover_scenarios(Path::new(SCENARIOS_DIR), None);
        let restart = discover_scenarios(Path::new(SCENARIOS_DIR), Some("restart"));
        assert!(!restart.is_empty());
        assert!(restart.len() < all.len());
        assert!(discover_scenarios(Path::new(SCENARIOS_DIR), Some("no-such-scenario")).is_empty());
    }
}

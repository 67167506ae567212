//! Scenario execution engine
//!
//! The game is not installed on the bus. Each step puts its request event on
//! the bus only so it shows up in the recorded sequence, then calls the game
//! directly so a rejected step surfaces as an error instead of a log line.

use std::sync::Arc;

use crate::error::GameError;
use crate::events::{
    AdvanceRoundRequested, EventBuffer, EventBus, GuessSubmitted, RestartRequested,
};
use crate::game::{Game, GameConfig};
use crate::geo::Coordinates;
use crate::locations::{LocationDatabase, LocationSource};
use crate::scoring::ScoringPolicy;

use super::assertions::{AssertionError, check_outcome, check_sequence, validate_event_names};
use super::parser::{PoolEntry, ScenarioDefinition, Step, StepAction};

/// Result of running a scenario
#[derive(Debug)]
pub enum TestResult {
    Pass { steps: usize, events: usize },
    Fail { error: AssertionError },
    Error { message: String },
}

impl TestResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }
}

/// Run a single scenario and return the result
pub fn run_scenario(scenario: &ScenarioDefinition) -> TestResult {
    if let Err(message) = validate_event_names(&scenario.expect.sequence) {
        return TestResult::Error { message };
    }

    let scoring = match &scenario.setup.scoring {
        Some(name) => match ScoringPolicy::from_name(name) {
            Some(policy) => policy,
            None => {
                return TestResult::Error {
                    message: format!("Unknown scoring policy '{}'", name),
                };
            }
        },
        None => ScoringPolicy::default(),
    };

    let source: Arc<dyn LocationSource> = if scenario.setup.pool.is_empty() {
        Arc::new(LocationDatabase::default_locations())
    } else {
        let pool: Result<Vec<_>, _> = scenario.setup.pool.iter().map(PoolEntry::to_poi).collect();
        match pool {
            Ok(pool) => Arc::new(LocationDatabase::new(pool)),
            Err(e) => {
                return TestResult::Error {
                    message: format!("Bad pool entry: {}", e),
                };
            }
        }
    };

    let config = GameConfig {
        round_count: scenario.setup.rounds,
        scoring,
        seed: Some(scenario.setup.seed),
    };

    let bus = EventBus::new();
    let buffer = EventBuffer::attached(&bus);

    let mut game = match Game::new(bus.clone(), source, config) {
        Ok(_) if scenario.expect.setup_error => {
            return TestResult::Fail {
                error: AssertionError {
                    message: "Game setup should have failed".to_string(),
                    expected: "setup error".to_string(),
                    actual: "game created".to_string(),
                },
            };
        }
        Ok(game) => game,
        Err(_) if scenario.expect.setup_error => {
            return TestResult::Pass {
                steps: 0,
                events: buffer.len(),
            };
        }
        Err(e) => {
            return TestResult::Error {
                message: format!("Game setup failed: {}", e),
            };
        }
    };

    for (i, step) in scenario.steps.iter().enumerate() {
        let outcome = match apply_step(&bus, &mut game, step) {
            Ok(outcome) => outcome,
            Err(message) => {
                return TestResult::Error {
                    message: format!("Step #{} ({}): {}", i + 1, step.action, message),
                };
            }
        };

        match (outcome, step.expect_error) {
            (Ok(()), true) => {
                return TestResult::Fail {
                    error: AssertionError {
                        message: format!("Step #{} ({}) should have been rejected", i + 1, step.action),
                        expected: "error".to_string(),
                        actual: "accepted".to_string(),
                    },
                };
            }
            (Err(e), false) => {
                return TestResult::Fail {
                    error: AssertionError {
                        message: format!("Step #{} ({}) was rejected", i + 1, step.action),
                        expected: "accepted".to_string(),
                        actual: e.to_string(),
                    },
                };
            }
            _ => {}
        }
    }

    if let Err(error) = check_sequence(&scenario.expect.sequence, &buffer.names()) {
        return TestResult::Fail { error };
    }
    if let Err(error) = check_outcome(&scenario.expect, &game) {
        return TestResult::Fail { error };
    }

    TestResult::Pass {
        steps: scenario.steps.len(),
        events: buffer.len(),
    }
}

/// Outer error: the script itself is broken. Inner: the game said no.
fn apply_step(bus: &EventBus, game: &mut Game, step: &Step) -> Result<Result<(), GameError>, String> {
    let outcome = match step.action {
        StepAction::Guess => {
            let guess = resolve_guess(game, step)?;
            bus.emit(GuessSubmitted(guess));
            game.handle_guess(guess).map(|_| ())
        }
        StepAction::Advance => {
            bus.emit(AdvanceRoundRequested);
            game.start_next_round()
        }
        StepAction::Restart => {
            bus.emit(RestartRequested);
            game.restart()
        }
    };
    Ok(outcome)
}

fn resolve_guess(game: &Game, step: &Step) -> Result<Coordinates, String> {
    if let Some(offset) = step.target_offset_m {
        let round = game
            .current_round()
            .ok_or_else(|| "target_offset_m needs a round in progress".to_string())?;
        return Ok(round.target().offset_north(offset));
    }

    match (step.lat, step.lng) {
        (Some(lat), Some(lng)) => Ok(Coordinates { lat, lng }),
        _ => Err("guess needs lat and lng, or target_offset_m".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(toml: &str) -> ScenarioDefinition {
        toml::from_str(toml).unwrap()
    }

    const POOL: &str = r#"
[[setup.pool]]
id = "a"
name = "Alpha"
lat = 48.0
lng = 2.0

[[setup.pool]]
id = "b"
name = "Beta"
lat = 45.0
lng = 5.0
"#;

    #[test]
    fn test_full_game_passes() {
        let def = scenario(&format!(
            r#"
name = "e2e"
[setup]
rounds = 2
seed = 3
{POOL}
[[step]]
action = "guess"
target_offset_m = 40.0

[[step]]
action = "advance"

[[step]]
action = "guess"
lat = -33.86
lng = 151.21

[[step]]
action = "advance"

[expect]
round_scores = [5000, 0]
total_score = 5000
ended = true
sequence = ["round:started", "guess:submitted", "round:ended", "round:advance-requested",
            "round:started", "guess:submitted", "round:ended", "round:advance-requested",
            "game:ended"]
"#
        ));
        let result = run_scenario(&def);
        assert!(matches!(result, TestResult::Pass { steps: 4, events: 9 }), "{:?}", result);
    }

    #[test]
    fn test_expected_rejection() {
        let def = scenario(&format!(
            r#"
name = "early advance"
[setup]
rounds = 1
{POOL}
[[step]]
action = "advance"
expect_error = true

[[step]]
action = "restart"
expect_error = true

[expect]
completed_rounds = 0
ended = false
"#
        ));
        assert!(run_scenario(&def).is_pass());
    }

    #[test]
    fn test_unexpected_rejection_fails() {
        let def = scenario(&format!(
            r#"
name = "early advance"
[setup]
rounds = 1
{POOL}
[[step]]
action = "advance"
"#
        ));
        assert!(matches!(run_scenario(&def), TestResult::Fail { .. }));
    }

    #[test]
    fn test_wrong_total_fails() {
        let def = scenario(&format!(
            r#"
name = "wrong total"
[setup]
rounds = 1
{POOL}
[[step]]
action = "guess"
target_offset_m = 0.0

[expect]
total_score = 1
"#
        ));
        let TestResult::Fail { error } = run_scenario(&def) else {
            panic!("expected failure");
        };
        assert_eq!(error.actual, "5000");
    }

    #[test]
    fn test_setup_error() {
        let def = scenario(&format!(
            r#"
name = "too many rounds"
[setup]
rounds = 3
{POOL}
[expect]
setup_error = true
"#
        ));
        assert!(run_scenario(&def).is_pass());
    }

    #[test]
    fn test_out_of_range_pool_entry_is_error() {
        let def = scenario(
            r#"
name = "off the map"
[setup]
rounds = 1

[[setup.pool]]
id = "x"
name = "Nowhere"
lat = 200.0
lng = 2.0
"#,
        );
        let TestResult::Error { message } = run_scenario(&def) else {
            panic!("expected setup error");
        };
        assert!(message.contains("Bad pool entry"), "{}", message);
    }

    #[test]
    fn test_unknown_event_name_is_error() {
        let def = scenario(
            r#"
name = "typo"
[expect]
sequence = ["round:begun"]
"#,
        );
        assert!(matches!(run_scenario(&def), TestResult::Error { .. }));
    }

    #[test]
    fn test_incomplete_guess_is_error() {
        let def = scenario(
            r#"
name = "half a guess"
[[step]]
action = "guess"
lat = 48.0
"#,
        );
        assert!(matches!(run_scenario(&def), TestResult::Error { .. }));
    }
}

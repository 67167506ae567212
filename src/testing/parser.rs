//! TOML scenario file parsing

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::GameError;
use crate::geo::Coordinates;
use crate::locations::PointOfInterest;

/// Complete scenario from a TOML file
#[derive(Debug, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub setup: ScenarioSetup,
    /// Player actions in order (uses [[step]] TOML syntax)
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub expect: ScenarioExpectations,
}

/// Game configuration for the scenario
#[derive(Debug, Deserialize)]
pub struct ScenarioSetup {
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    /// Location draw seed; scenarios are always deterministic
    #[serde(default)]
    pub seed: u64,
    /// Scoring policy name (threshold / exponential)
    pub scoring: Option<String>,
    /// Location pool; empty means the built-in landmarks
    #[serde(default)]
    pub pool: Vec<PoolEntry>,
}

impl Default for ScenarioSetup {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            seed: 0,
            scoring: None,
            pool: Vec::new(),
        }
    }
}

fn default_rounds() -> usize {
    crate::constants::DEFAULT_ROUND_COUNT
}

/// One point of interest in an inline pool
#[derive(Debug, Clone, Deserialize)]
pub struct PoolEntry {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl PoolEntry {
    pub fn to_poi(&self) -> Result<PointOfInterest, GameError> {
        let coordinates = Coordinates::new(self.lat, self.lng)?;
        Ok(PointOfInterest::new(self.id.clone(), self.name.clone(), coordinates))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Guess,
    Advance,
    Restart,
}

impl std::fmt::Display for StepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepAction::Guess => write!(f, "guess"),
            StepAction::Advance => write!(f, "advance"),
            StepAction::Restart => write!(f, "restart"),
        }
    }
}

/// A scripted player action
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub action: StepAction,
    /// Absolute guess position
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Guess this many metres north of the current target instead
    pub target_offset_m: Option<f64>,
    /// The step must be rejected by the game
    #[serde(default)]
    pub expect_error: bool,
}

/// Expected outcome once every step has run
#[derive(Debug, Default, Deserialize)]
pub struct ScenarioExpectations {
    /// Scores of the completed rounds, in round order
    pub round_scores: Option<Vec<u32>>,
    pub total_score: Option<u64>,
    pub ended: Option<bool>,
    pub completed_rounds: Option<usize>,
    /// Event names that must appear in this order (other events may sit between them)
    #[serde(default)]
    pub sequence: Vec<String>,
    /// Game creation itself must fail
    #[serde(default)]
    pub setup_error: bool,
}

/// Parse a scenario file from path
pub fn parse_scenario_file(path: &Path) -> Result<ScenarioDefinition, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

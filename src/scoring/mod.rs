//! Scoring module - turns a guess distance into round points
//!
//! Two policies exist. A game uses exactly one of them, picked through its
//! config; they are never mixed within a game.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// How a round converts distance (metres) into a score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Discrete bands from SCORE_THRESHOLDS
    #[default]
    Threshold,
    /// Continuous decay: `max_score * e^(-distance / scale_m)`
    ExponentialDecay {
        max_score: u32,
        max_score_radius_m: f64,
        scale_m: f64,
    },
}

impl ScoringPolicy {
    /// Exponential decay with the stock constants
    pub fn exponential() -> Self {
        ScoringPolicy::ExponentialDecay {
            max_score: MAX_SCORE,
            max_score_radius_m: MAX_SCORE_RADIUS_METERS,
            scale_m: SCORE_SCALE_METERS,
        }
    }

    /// Parse a policy name as used on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "threshold" | "thresholds" => Some(ScoringPolicy::Threshold),
            "exponential" | "exponential_decay" | "decay" => Some(Self::exponential()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoringPolicy::Threshold => "threshold",
            ScoringPolicy::ExponentialDecay { .. } => "exponential_decay",
        }
    }

    /// Best score this policy can award
    pub fn max_score(&self) -> u32 {
        match self {
            ScoringPolicy::Threshold => SCORE_THRESHOLDS[0].1,
            ScoringPolicy::ExponentialDecay { max_score, .. } => *max_score,
        }
    }

    /// Score for a guess `distance_m` metres from the target
    pub fn score(&self, distance_m: u32) -> u32 {
        match *self {
            ScoringPolicy::Threshold => threshold_score(distance_m),
            ScoringPolicy::ExponentialDecay {
                max_score,
                max_score_radius_m,
                scale_m,
            } => exponential_score(distance_m, max_score, max_score_radius_m, scale_m),
        }
    }
}

/// Score of the first band whose limit is >= distance, else 0
pub fn threshold_score(distance_m: u32) -> u32 {
    SCORE_THRESHOLDS
        .iter()
        .find(|(limit, _)| *limit >= distance_m)
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

pub fn exponential_score(distance_m: u32, max_score: u32, max_score_radius_m: f64, scale_m: f64) -> u32 {
    let distance = distance_m as f64;
    if distance < max_score_radius_m {
        return max_score;
    }
    // A non-positive scale would blow up; treat it as "only perfect guesses count"
    if scale_m <= 0.0 {
        return 0;
    }
    let raw = max_score as f64 * (-distance / scale_m).exp();
    (raw.max(0.0).round() as u32).min(max_score)
}

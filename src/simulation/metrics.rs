//! Metrics collection for simulated games

use serde::{Deserialize, Serialize};

use crate::constants::SCORE_THRESHOLDS;
use crate::game::GameSummary;

use super::config::SimConfig;

/// Result of a single simulated game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    /// RNG seed used
    pub seed: u64,
    pub total_score: u64,
    pub round_scores: Vec<u32>,
    pub distances_m: Vec<u32>,
}

impl GameResult {
    pub fn from_summary(seed: u64, summary: &GameSummary) -> Self {
        Self {
            seed,
            total_score: summary.total_score,
            round_scores: summary.rounds.iter().map(|r| r.score.unwrap_or(0)).collect(),
            distances_m: summary.rounds.iter().filter_map(|r| r.distance_m).collect(),
        }
    }
}

/// How many guesses landed in one distance band of the threshold table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    /// Upper bound in metres (None = beyond the last threshold)
    pub max_distance_m: Option<u32>,
    pub count: u32,
}

/// Aggregates over a batch of games
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimMetrics {
    pub games: u32,
    /// Games that could not be played (e.g. pool too small)
    pub failed: u32,
    pub strategy: String,
    pub scoring: String,
    pub round_count: usize,
    pub mean_total: f64,
    pub min_total: u64,
    pub max_total: u64,
    /// Mean score of round i across games
    pub per_round_mean: Vec<f64>,
    pub mean_distance_m: f64,
    pub distance_bands: Vec<DistanceBand>,
}

impl SimMetrics {
    pub fn from_results(config: &SimConfig, results: &[GameResult], failed: u32) -> Self {
        let mut metrics = Self {
            games: results.len() as u32,
            failed,
            strategy: config.strategy.label(),
            scoring: config.scoring.name().to_string(),
            round_count: config.round_count,
            distance_bands: empty_bands(),
            ..Default::default()
        };

        if results.is_empty() {
            return metrics;
        }

        let totals: Vec<u64> = results.iter().map(|r| r.total_score).collect();
        metrics.mean_total = mean(totals.iter().map(|&t| t as f64));
        metrics.min_total = totals.iter().copied().min().unwrap_or(0);
        metrics.max_total = totals.iter().copied().max().unwrap_or(0);

        metrics.per_round_mean = (0..config.round_count)
            .map(|i| mean(results.iter().filter_map(|r| r.round_scores.get(i)).map(|&s| s as f64)))
            .collect();

        let distances = results.iter().flat_map(|r| r.distances_m.iter().copied());
        metrics.mean_distance_m = mean(distances.clone().map(|d| d as f64));
        for distance in distances {
            let band = band_index(distance);
            metrics.distance_bands[band].count += 1;
        }

        metrics
    }
}

fn empty_bands() -> Vec<DistanceBand> {
    SCORE_THRESHOLDS
        .iter()
        .map(|&(limit, _)| Some(limit))
        .chain(std::iter::once(None))
        .map(|max_distance_m| DistanceBand {
            max_distance_m,
            count: 0,
        })
        .collect()
}

/// Same band boundaries as the threshold scorer (inclusive upper bound)
fn band_index(distance_m: u32) -> usize {
    SCORE_THRESHOLDS
        .iter()
        .position(|&(limit, _)| distance_m <= limit)
        .unwrap_or(SCORE_THRESHOLDS.len())
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

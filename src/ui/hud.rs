//! Text panels printed in response to game events

use crate::events::{EventBus, GameEnded, RoundEnded, RoundStarted};

/// Round header plus the POI's descriptive attributes
pub fn format_round_started(event: &RoundStarted) -> String {
    let round = &event.round;
    let mut lines = vec![format!(
        "=== Round {}/{} ===\nWhere is: {}",
        round.index + 1,
        event.round_count,
        round.poi.name
    )];

    for (key, value) in &round.poi.attributes {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        lines.push(format!("  {}: {}", key, value));
    }

    lines.push("Enter your guess as <lat> <lng>".to_string());
    lines.join("\n")
}

pub fn format_round_ended(event: &RoundEnded) -> String {
    let round = &event.0;
    let distance = match round.distance_m {
        Some(m) if m >= 10_000 => format!("{:.1} km", m as f64 / 1000.0),
        Some(m) => format!("{} m", m),
        None => "?".to_string(),
    };
    format!(
        "{} is at {}. You were {} away: {} pts\nType 'next' to continue",
        round.poi.name,
        round.poi.coordinates,
        distance,
        round.score.unwrap_or(0)
    )
}

pub fn format_game_ended(event: &GameEnded) -> String {
    let summary = &event.0;
    let mut lines = vec!["=== Game over ===".to_string()];
    for round in &summary.rounds {
        lines.push(format!(
            "  {}. {:<30} {:>5} pts",
            round.index + 1,
            round.poi.name,
            round.score.unwrap_or(0)
        ));
    }
    lines.push(format!(
        "Total: {} pts over {} rounds",
        summary.total_score, summary.round_count
    ));
    lines.push("Type 'restart' to play again or 'quit' to leave".to_string());
    lines.join("\n")
}

/// Print the panels to stdout as events arrive
pub fn attach_hud(bus: &EventBus) {
    bus.on::<RoundStarted>(|event| println!("\n{}", format_round_started(event)));
    bus.on::<RoundEnded>(|event| println!("{}", format_round_ended(event)));
    bus.on::<GameEnded>(|event| println!("\n{}", format_game_ended(event)));
}

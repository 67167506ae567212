//! Terminal front end - a UI collaborator that only talks through the bus
//!
//! Input lines become bus events; round and game events are rendered by the
//! HUD listeners in `hud`.

mod hud;

pub use hud::{attach_hud, format_game_ended, format_round_ended, format_round_started};

use crate::events::{AdvanceRoundRequested, EventBus, GuessSubmitted, RestartRequested};
use crate::geo::Coordinates;

/// One line of player input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Guess(Coordinates),
    Next,
    Restart,
    Score,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

/// Parse a line typed at the prompt.
///
/// Accepts `<lat> <lng>`, `guess <lat> <lng>` (comma separators allowed) and
/// the single-word commands.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    match line.to_lowercase().as_str() {
        "next" | "n" => return Command::Next,
        "restart" | "r" => return Command::Restart,
        "score" | "s" => return Command::Score,
        "help" | "h" | "?" => return Command::Help,
        "quit" | "q" | "exit" => return Command::Quit,
        _ => {}
    }

    let coords = line.strip_prefix("guess").unwrap_or(line);
    let parts: Vec<&str> = coords
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    if parts.len() != 2 {
        return Command::Invalid(format!("Unknown command: {}", line));
    }

    let (Ok(lat), Ok(lng)) = (parts[0].parse::<f64>(), parts[1].parse::<f64>()) else {
        return Command::Invalid(format!("Could not read coordinates from: {}", line));
    };

    match Coordinates::new(lat, lng) {
        Ok(coords) => Command::Guess(coords),
        Err(e) => Command::Invalid(e.to_string()),
    }
}

/// Emit the bus event a command stands for. Returns false for non-bus commands.
pub fn emit_command(bus: &EventBus, command: &Command) -> bool {
    match command {
        Command::Guess(coords) => bus.emit(GuessSubmitted(*coords)),
        Command::Next => bus.emit(AdvanceRoundRequested),
        Command::Restart => bus.emit(RestartRequested),
        _ => return false,
    }
    true
}

//! Assertion checking for scenario expectations

use super::parser::ScenarioExpectations;
use crate::events::EventKind;
use crate::game::Game;

/// Error when an assertion fails
#[derive(Debug)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n    Expected: {}\n    Actual: {}", self.message, self.expected, self.actual)
    }
}

/// Reject event names that no event carries (a typo would otherwise read as "not found")
pub fn validate_event_names(expected: &[String]) -> Result<(), String> {
    for name in expected {
        if EventKind::from_name(name).is_none() {
            return Err(format!(
                "Unknown event '{}'. Known: {:?}",
                name,
                EventKind::ALL.iter().map(|k| k.name()).collect::<Vec<_>>()
            ));
        }
    }
    Ok(())
}

/// Check that `expected` occurs in `captured` in order, gaps allowed
pub fn check_sequence(expected: &[String], captured: &[&str]) -> Result<(), AssertionError> {
    let mut captured_idx = 0;

    for (i, exp) in expected.iter().enumerate() {
        let found = captured[captured_idx..].iter().position(|name| name == exp);

        match found {
            Some(offset) => captured_idx += offset + 1,
            None => {
                return Err(AssertionError {
                    message: format!("Event #{} '{}' not found", i + 1, exp),
                    expected: format!("'{}' event in sequence", exp),
                    actual: format!(
                        "events after position {}: {:?}",
                        captured_idx,
                        &captured[captured_idx..]
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Check score and lifecycle expectations against the finished game
pub fn check_outcome(expect: &ScenarioExpectations, game: &Game) -> Result<(), AssertionError> {
    if let Some(expected) = &expect.round_scores {
        let actual: Vec<u32> = game.rounds().iter().filter_map(|r| r.score()).collect();
        if &actual != expected {
            return Err(AssertionError {
                message: "Round scores differ".to_string(),
                expected: format!("{:?}", expected),
                actual: format!("{:?}", actual),
            });
        }
    }

    if let Some(expected) = expect.total_score
        && game.total_score() != expected
    {
        return Err(AssertionError {
            message: "Total score differs".to_string(),
            expected: expected.to_string(),
            actual: game.total_score().to_string(),
        });
    }

    if let Some(expected) = expect.completed_rounds
        && game.completed_rounds() != expected
    {
        return Err(AssertionError {
            message: "Completed round count differs".to_string(),
            expected: expected.to_string(),
            actual: game.completed_rounds().to_string(),
        });
    }

    if let Some(expected) = expect.ended
        && game.is_ended() != expected
    {
        return Err(AssertionError {
            message: "Game end state differs".to_string(),
            expected: format!("ended = {}", expected),
            actual: format!("game is {}", game.phase()),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sequence_allows_gaps() {
        let captured = ["round:started", "guess:submitted", "round:ended", "game:ended"];
        assert!(check_sequence(&names(&["round:started", "game:ended"]), &captured).is_ok());
        assert!(check_sequence(&[], &captured).is_ok());
    }

    #[test]
    fn test_sequence_respects_order() {
        let captured = ["round:ended", "round:started"];
        let err = check_sequence(&names(&["round:started", "round:ended"]), &captured).unwrap_err();
        assert!(err.message.contains("#2 'round:ended'"));
    }

    #[test]
    fn test_sequence_counts_repeats() {
        let captured = ["round:started", "round:ended"];
        assert!(check_sequence(&names(&["round:started", "round:started"]), &captured).is_err());
    }

    #[test]
    fn test_validate_event_names() {
        assert!(validate_event_names(&names(&["game:ended", "round:advance-requested"])).is_ok());
        assert!(validate_event_names(&names(&["game:over"])).is_err());
    }
}

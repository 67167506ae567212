//! Round module - single-round state machine
//!
//! A round moves Pending -> InProgress -> Completed and never back. The guess,
//! its distance and its score only exist inside `RoundState::Completed`, so
//! they are set together or not at all.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GameError;
use crate::events::{EventBus, RoundEnded};
use crate::geo::Coordinates;
use crate::locations::PointOfInterest;
use crate::scoring::ScoringPolicy;

/// Lifecycle status of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundStatus::Pending => write!(f, "pending"),
            RoundStatus::InProgress => write!(f, "in progress"),
            RoundStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Result of the one guess a round accepts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub guess: Coordinates,
    pub distance_m: u32,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RoundState {
    Pending,
    InProgress,
    Completed(RoundOutcome),
}

/// Read-only snapshot of a round, carried by round events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// Position in the game's round sequence (0-based)
    pub index: usize,
    pub poi: PointOfInterest,
    pub status: RoundStatus,
    pub guess: Option<Coordinates>,
    pub distance_m: Option<u32>,
    pub score: Option<u32>,
}

/// One round: a target location and at most one guess
pub struct Round {
    bus: EventBus,
    index: usize,
    poi: PointOfInterest,
    policy: ScoringPolicy,
    state: RoundState,
}

impl Round {
    pub fn new(bus: EventBus, index: usize, poi: PointOfInterest, policy: ScoringPolicy) -> Self {
        Self {
            bus,
            index,
            poi,
            policy,
            state: RoundState::Pending,
        }
    }

    /// Pending -> InProgress
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.state != RoundState::Pending {
            return Err(self.invalid_state("start"));
        }
        self.state = RoundState::InProgress;
        debug!("Round {} started ({})", self.index + 1, self.poi.name);
        Ok(())
    }

    /// InProgress -> Completed. Scores the guess and emits RoundEnded.
    ///
    /// Invalid coordinates are rejected without changing state.
    pub fn submit_guess(&mut self, guess: Coordinates) -> Result<RoundOutcome, GameError> {
        if self.state != RoundState::InProgress {
            return Err(self.invalid_state("submit a guess to"));
        }
        guess.validate()?;

        let distance_m = guess.distance_to(&self.poi.coordinates);
        let score = self.policy.score(distance_m);
        let outcome = RoundOutcome {
            guess,
            distance_m,
            score,
        };
        self.state = RoundState::Completed(outcome);

        info!(
            "Round {} ({}): guess {} is {} m away, {} pts",
            self.index + 1,
            self.poi.name,
            guess,
            distance_m,
            score
        );

        self.bus.emit(RoundEnded(self.summary()));
        Ok(outcome)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn poi(&self) -> &PointOfInterest {
        &self.poi
    }

    pub fn target(&self) -> Coordinates {
        self.poi.coordinates
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    pub fn status(&self) -> RoundStatus {
        match self.state {
            RoundState::Pending => RoundStatus::Pending,
            RoundState::InProgress => RoundStatus::InProgress,
            RoundState::Completed(_) => RoundStatus::Completed,
        }
    }

    pub fn outcome(&self) -> Option<&RoundOutcome> {
        match &self.state {
            RoundState::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn guess(&self) -> Option<Coordinates> {
        self.outcome().map(|o| o.guess)
    }

    pub fn distance_m(&self) -> Option<u32> {
        self.outcome().map(|o| o.distance_m)
    }

    pub fn score(&self) -> Option<u32> {
        self.outcome().map(|o| o.score)
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            index: self.index,
            poi: self.poi.clone(),
            status: self.status(),
            guess: self.guess(),
            distance_m: self.distance_m(),
            score: self.score(),
        }
    }

    fn invalid_state(&self, action: &'static str) -> GameError {
        GameError::InvalidRoundState {
            index: self.index,
            action,
            status: self.status(),
        }
    }
}

impl std::fmt::Debug for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Round")
            .field("index", &self.index)
            .field("poi", &self.poi.id)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventBuffer, EventKind, GameEvent};

    fn eiffel() -> PointOfInterest {
        PointOfInterest::new("eiffel", "Tour Eiffel", Coordinates { lat: 48.8584, lng: 2.2945 })
    }

    fn new_round(bus: &EventBus) -> Round {
        Round::new(bus.clone(), 0, eiffel(), ScoringPolicy::Threshold)
    }

    #[test]
    fn test_starts_pending_with_nothing_set() {
        let round = new_round(&EventBus::new());
        assert_eq!(round.status(), RoundStatus::Pending);
        assert_eq!(round.guess(), None);
        assert_eq!(round.distance_m(), None);
        assert_eq!(round.score(), None);
    }

    #[test]
    fn test_guess_before_start_fails() {
        let bus = EventBus::new();
        let buffer = EventBuffer::attached(&bus);
        let mut round = new_round(&bus);

        let err = round.submit_guess(eiffel().coordinates).unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidRoundState {
                index: 0,
                action: "submit a guess to",
                status: RoundStatus::Pending,
            }
        );
        assert_eq!(round.status(), RoundStatus::Pending);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_exactly_one_guess_accepted() {
        let bus = EventBus::new();
        let mut round = new_round(&bus);
        round.start().unwrap();

        let outcome = round.submit_guess(eiffel().coordinates.offset_north(50.0)).unwrap();
        assert_eq!(outcome.distance_m, 50);
        assert_eq!(outcome.score, 5000);
        assert_eq!(round.status(), RoundStatus::Completed);

        let err = round.submit_guess(eiffel().coordinates).unwrap_err();
        assert!(err.is_contract_violation());
        // First outcome is untouched
        assert_eq!(round.outcome(), Some(&outcome));
    }

    #[test]
    fn test_double_start_fails() {
        let mut round = new_round(&EventBus::new());
        round.start().unwrap();
        let err = round.start().unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidRoundState {
                status: RoundStatus::InProgress,
                ..
            }
        ));
    }

    #[test]
    fn test_round_ended_event_carries_summary() {
        let bus = EventBus::new();
        let buffer = EventBuffer::attached(&bus);
        let mut round = new_round(&bus);
        round.start().unwrap();

        // ~343 km away: scores nothing on the threshold table
        let london = Coordinates { lat: 51.5074, lng: -0.1278 };
        round.submit_guess(london).unwrap();

        assert_eq!(buffer.kinds(), vec![EventKind::RoundEnded]);
        let Some(GameEvent::RoundEnded(ended)) = buffer.last() else {
            panic!("Wrong event type");
        };
        assert_eq!(ended.0.status, RoundStatus::Completed);
        assert_eq!(ended.0.guess, Some(london));
        assert_eq!(ended.0.score, Some(0));
        assert!(ended.0.distance_m.unwrap() > 300_000);
        assert_eq!(ended.0.poi.id, "eiffel");
    }

    #[test]
    fn test_invalid_guess_leaves_round_open() {
        let mut round = new_round(&EventBus::new());
        round.start().unwrap();

        let err = round.submit_guess(Coordinates { lat: 123.0, lng: 0.0 }).unwrap_err();
        assert!(matches!(err, GameError::InvalidCoordinates { .. }));
        assert_eq!(round.status(), RoundStatus::InProgress);
        assert!(round.submit_guess(eiffel().coordinates).is_ok());
    }

    #[test]
    fn test_exponential_policy_is_used_when_configured() {
        let mut round = Round::new(EventBus::new(), 3, eiffel(), ScoringPolicy::exponential());
        round.start().unwrap();
        let outcome = round.submit_guess(eiffel().coordinates.offset_north(10.0)).unwrap();
        assert_eq!(outcome.score, 5000);
        assert_eq!(round.summary().index, 3);
    }
}

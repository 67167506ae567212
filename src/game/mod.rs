//! Game module - orchestrates a fixed sequence of rounds
//!
//! The Game draws its targets from a LocationSource, runs the rounds strictly
//! in order, sums their scores and announces the end of the game. Once
//! installed on a bus it is driven entirely by events:
//! - GuessSubmitted -> current round's `submit_guess` (no-op without one)
//! - AdvanceRoundRequested -> `start_next_round`
//! - RestartRequested -> `restart`

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::constants::DEFAULT_ROUND_COUNT;
use crate::error::GameError;
use crate::events::{
    AdvanceRoundRequested, EventBus, GameEnded, GuessSubmitted, RestartRequested, RoundStarted,
};
use crate::geo::Coordinates;
use crate::locations::LocationSource;
use crate::round::{Round, RoundOutcome, RoundStatus, RoundSummary};
use crate::scoring::ScoringPolicy;

/// Per-game settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub round_count: usize,
    pub scoring: ScoringPolicy,
    /// RNG seed for location draws (None = random)
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_count: DEFAULT_ROUND_COUNT,
            scoring: ScoringPolicy::Threshold,
            seed: None,
        }
    }
}

/// Where the game is in its lifecycle (derived from round states)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// A round is waiting for a guess
    RoundInProgress,
    /// Last round is completed, waiting for the player to advance
    AwaitingAdvance,
    /// All rounds done and GameEnded emitted
    Ended,
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GamePhase::RoundInProgress => write!(f, "round in progress"),
            GamePhase::AwaitingAdvance => write!(f, "awaiting next round"),
            GamePhase::Ended => write!(f, "ended"),
        }
    }
}

/// Read-only snapshot of a game, carried by GameEnded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub total_score: u64,
    pub round_count: usize,
    pub rounds: Vec<RoundSummary>,
}

pub struct Game {
    bus: EventBus,
    source: Arc<dyn LocationSource>,
    config: GameConfig,
    rng: StdRng,
    rounds: Vec<Round>,
    ended: bool,
}

impl Game {
    /// Draw locations, build the rounds and start the first one.
    ///
    /// Fails without creating anything if the source is too small or the
    /// config asks for zero rounds.
    pub fn new(
        bus: EventBus,
        source: Arc<dyn LocationSource>,
        config: GameConfig,
    ) -> Result<Self, GameError> {
        if config.round_count == 0 {
            return Err(GameError::InvalidConfig(
                "round count must be at least 1".to_string(),
            ));
        }
        if u64::from(config.scoring.max_score())
            .checked_mul(config.round_count as u64)
            .is_none()
        {
            return Err(GameError::InvalidConfig(format!(
                "{} rounds of up to {} points overflow the total score",
                config.round_count,
                config.scoring.max_score()
            )));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut game = Self {
            bus,
            source,
            config,
            rng,
            rounds: Vec::new(),
            ended: false,
        };
        game.rounds = game.create_rounds()?;
        info!(
            "New game: {} rounds, {} scoring",
            config.round_count,
            config.scoring.name()
        );
        game.start_next_round()?;
        Ok(game)
    }

    /// Build a game and subscribe it to the bus.
    ///
    /// The bus only keeps weak references, so dropping the returned handle
    /// turns the listeners into no-ops.
    pub fn install(
        bus: &EventBus,
        source: Arc<dyn LocationSource>,
        config: GameConfig,
    ) -> Result<Rc<RefCell<Game>>, GameError> {
        let game = Rc::new(RefCell::new(Game::new(bus.clone(), source, config)?));

        let weak = Rc::downgrade(&game);
        bus.on::<GuessSubmitted>(move |event| {
            with_game(&weak, "guess", |game| game.handle_guess(event.0).map(|_| ()));
        });

        let weak = Rc::downgrade(&game);
        bus.on::<AdvanceRoundRequested>(move |_| {
            with_game(&weak, "advance", Game::start_next_round);
        });

        let weak = Rc::downgrade(&game);
        bus.on::<RestartRequested>(move |_| {
            with_game(&weak, "restart", Game::restart);
        });

        Ok(game)
    }

    /// Start the first pending round, or end the game if none is left
    pub fn start_next_round(&mut self) -> Result<(), GameError> {
        if self.ended || self.current_round().is_some() {
            return Err(GameError::InvalidGameState {
                action: "advance to the next round",
                phase: self.phase(),
            });
        }

        let round_count = self.rounds.len();
        match self.rounds.iter_mut().find(|r| r.status() == RoundStatus::Pending) {
            Some(round) => {
                round.start()?;
                let summary = round.summary();
                self.bus.emit(RoundStarted {
                    round: summary,
                    round_count,
                });
            }
            None => {
                self.ended = true;
                info!("Game over! Total score: {}", self.total_score());
                self.bus.emit(GameEnded(self.summary()));
            }
        }
        Ok(())
    }

    /// Relay a guess to the current round.
    ///
    /// Returns Ok(None) when no round is active: a late or duplicate submit
    /// from the UI is ignored rather than treated as an error.
    pub fn handle_guess(&mut self, guess: Coordinates) -> Result<Option<RoundOutcome>, GameError> {
        match self.current_round_mut() {
            Some(round) => round.submit_guess(guess).map(Some),
            None => {
                debug!("Ignoring guess {}: no round in progress", guess);
                Ok(None)
            }
        }
    }

    /// Throw away the rounds and play again with freshly drawn locations
    pub fn restart(&mut self) -> Result<(), GameError> {
        if !self.ended {
            return Err(GameError::InvalidGameState {
                action: "restart",
                phase: self.phase(),
            });
        }

        // Draw first so a failure leaves the finished game intact
        let rounds = self.create_rounds()?;
        self.rounds = rounds;
        self.ended = false;
        info!("Game restarted");
        self.start_next_round()
    }

    /// Sum of completed round scores
    pub fn total_score(&self) -> u64 {
        self.rounds
            .iter()
            .map(|r| u64::from(r.score().unwrap_or(0)))
            .sum()
    }

    /// The round currently accepting a guess
    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.iter().find(|r| r.status() == RoundStatus::InProgress)
    }

    /// The round that will start on the next advance
    pub fn next_round(&self) -> Option<&Round> {
        self.rounds.iter().find(|r| r.status() == RoundStatus::Pending)
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn completed_rounds(&self) -> usize {
        self.rounds
            .iter()
            .filter(|r| r.status() == RoundStatus::Completed)
            .count()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn phase(&self) -> GamePhase {
        if self.ended {
            GamePhase::Ended
        } else if self.current_round().is_some() {
            GamePhase::RoundInProgress
        } else {
            GamePhase::AwaitingAdvance
        }
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            total_score: self.total_score(),
            round_count: self.rounds.len(),
            rounds: self.rounds.iter().map(Round::summary).collect(),
        }
    }

    fn current_round_mut(&mut self) -> Option<&mut Round> {
        self.rounds
            .iter_mut()
            .find(|r| r.status() == RoundStatus::InProgress)
    }

    fn create_rounds(&mut self) -> Result<Vec<Round>, GameError> {
        let locations = self
            .source
            .random_locations(self.config.round_count, &mut self.rng)?;

        Ok(locations
            .into_iter()
            .enumerate()
            .map(|(index, poi)| Round::new(self.bus.clone(), index, poi, self.config.scoring))
            .collect())
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("config", &self.config)
            .field("rounds", &self.rounds)
            .field("ended", &self.ended)
            .finish()
    }
}

/// Run a bus-triggered game action, reporting contract violations
fn with_game(
    weak: &Weak<RefCell<Game>>,
    what: &str,
    action: impl FnOnce(&mut Game) -> Result<(), GameError>,
) {
    let Some(game) = weak.upgrade() else {
        return;
    };
    let Ok(mut game) = game.try_borrow_mut() else {
        error!("Dropped {} event: game is busy (emitted while the game was borrowed)", what);
        return;
    };
    if let Err(e) = action(&mut game) {
        error!("Rejected {} event: {}", what, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventBuffer, EventKind, GameEvent, RoundEnded};
    use crate::locations::{LocationDatabase, PointOfInterest};

    fn pool(n: usize) -> Arc<dyn LocationSource> {
        Arc::new(LocationDatabase::new(
            (0..n)
                .map(|i| {
                    PointOfInterest::new(
                        format!("p{}", i),
                        format!("Place {}", i),
                        Coordinates {
                            lat: 48.0 + i as f64 * 0.1,
                            lng: 2.0,
                        },
                    )
                })
                .collect(),
        ))
    }

    fn config(round_count: usize) -> GameConfig {
        GameConfig {
            round_count,
            scoring: ScoringPolicy::Threshold,
            seed: Some(99),
        }
    }

    fn far_away() -> Coordinates {
        Coordinates { lat: -33.86, lng: 151.21 }
    }

    #[test]
    fn test_new_game_starts_first_round() {
        let bus = EventBus::new();
        let buffer = EventBuffer::attached(&bus);
        let game = Game::new(bus, pool(10), config(6)).unwrap();

        assert_eq!(game.round_count(), 6);
        assert_eq!(game.rounds()[0].status(), RoundStatus::InProgress);
        for round in &game.rounds()[1..] {
            assert_eq!(round.status(), RoundStatus::Pending);
        }
        assert_eq!(game.phase(), GamePhase::RoundInProgress);
        assert_eq!(game.current_round().unwrap().index(), 0);
        assert_eq!(game.next_round().unwrap().index(), 1);
        assert_eq!(game.total_score(), 0);
        assert_eq!(buffer.kinds(), vec![EventKind::RoundStarted]);
    }

    #[test]
    fn test_rounds_use_distinct_locations() {
        let game = Game::new(EventBus::new(), pool(6), config(6)).unwrap();
        let mut ids: Vec<_> = game.rounds().iter().map(|r| r.poi().id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_not_enough_locations() {
        let err = Game::new(EventBus::new(), pool(3), config(6)).unwrap_err();
        assert_eq!(
            err,
            GameError::NotEnoughLocations {
                requested: 6,
                available: 3
            }
        );
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let err = Game::new(EventBus::new(), pool(3), config(0)).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_same_seed_same_targets() {
        let a = Game::new(EventBus::new(), pool(12), config(5)).unwrap();
        let b = Game::new(EventBus::new(), pool(12), config(5)).unwrap();
        let ids = |g: &Game| g.rounds().iter().map(|r| r.poi().id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_advance_while_round_in_progress_fails() {
        let mut game = Game::new(EventBus::new(), pool(4), config(2)).unwrap();
        let err = game.start_next_round().unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidGameState {
                action: "advance to the next round",
                phase: GamePhase::RoundInProgress,
            }
        );
        // Still exactly one active round
        assert_eq!(
            game.rounds()
                .iter()
                .filter(|r| r.status() == RoundStatus::InProgress)
                .count(),
            1
        );
    }

    #[test]
    fn test_total_score_sums_rounds() {
        let mut game = Game::new(EventBus::new(), pool(6), config(3)).unwrap();

        let target = game.current_round().unwrap().target();
        game.handle_guess(target.offset_north(50.0)).unwrap();
        game.start_next_round().unwrap();

        let target = game.current_round().unwrap().target();
        game.handle_guess(target.offset_north(5_000.0)).unwrap();
        game.start_next_round().unwrap();

        game.handle_guess(far_away()).unwrap();

        let per_round: u32 = game.rounds().iter().map(|r| r.score().unwrap()).sum();
        assert_eq!(per_round, 5000 + 2500);
        assert_eq!(game.total_score(), u64::from(per_round));
        assert_eq!(game.phase(), GamePhase::AwaitingAdvance);
        assert!(game.next_round().is_none());
    }

    #[test]
    fn test_total_score_beyond_u32() {
        let scoring = ScoringPolicy::ExponentialDecay {
            max_score: u32::MAX,
            max_score_radius_m: 100.0,
            scale_m: 1_000.0,
        };
        let config = GameConfig {
            scoring,
            ..config(2)
        };
        let mut game = Game::new(EventBus::new(), pool(4), config).unwrap();

        let target = game.current_round().unwrap().target();
        game.handle_guess(target).unwrap();
        game.start_next_round().unwrap();
        let target = game.current_round().unwrap().target();
        game.handle_guess(target).unwrap();

        assert_eq!(game.total_score(), 2 * u64::from(u32::MAX));
        assert_eq!(game.summary().total_score, 2 * u64::from(u32::MAX));
    }

    #[test]
    fn test_unbounded_total_rejected() {
        let scoring = ScoringPolicy::ExponentialDecay {
            max_score: u32::MAX,
            max_score_radius_m: 100.0,
            scale_m: 1_000.0,
        };
        let config = GameConfig {
            scoring,
            ..config(usize::MAX)
        };
        let err = Game::new(EventBus::new(), pool(4), config).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_guess_without_current_round_is_noop() {
        let bus = EventBus::new();
        let mut game = Game::new(bus.clone(), pool(2), config(1)).unwrap();
        game.handle_guess(far_away()).unwrap();

        let buffer = EventBuffer::attached(&bus);
        assert_eq!(game.handle_guess(far_away()).unwrap(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_game_end_and_restart() {
        let bus = EventBus::new();
        let buffer = EventBuffer::attached(&bus);
        let mut game = Game::new(bus, pool(4), config(1)).unwrap();

        let err = game.restart().unwrap_err();
        assert!(err.is_contract_violation());

        game.handle_guess(far_away()).unwrap();
        game.start_next_round().unwrap();
        assert_eq!(game.phase(), GamePhase::Ended);
        assert_eq!(buffer.count(EventKind::GameEnded), 1);

        // Advancing past the end is a contract violation, not a second GameEnded
        assert!(game.start_next_round().is_err());
        assert_eq!(buffer.count(EventKind::GameEnded), 1);

        game.restart().unwrap();
        assert_eq!(game.phase(), GamePhase::RoundInProgress);
        assert_eq!(game.round_count(), 1);
        assert_eq!(game.total_score(), 0);
        assert_eq!(buffer.count(EventKind::RoundStarted), 2);
    }

    #[test]
    fn test_installed_game_end_to_end() {
        let bus = EventBus::new();
        let buffer = EventBuffer::attached(&bus);
        let game = Game::install(&bus, pool(2), config(2)).unwrap();

        // Round 1: guess 40 m from the target
        let target = game.borrow().current_round().unwrap().target();
        bus.emit(GuessSubmitted(target.offset_north(40.0)));
        assert_eq!(game.borrow().rounds()[0].score(), Some(5000));

        bus.emit(AdvanceRoundRequested);
        assert_eq!(game.borrow().rounds()[1].status(), RoundStatus::InProgress);

        // Round 2: guess on the other side of the planet
        bus.emit(GuessSubmitted(far_away()));
        assert_eq!(game.borrow().rounds()[1].score(), Some(0));

        bus.emit(AdvanceRoundRequested);

        assert_eq!(
            buffer.kinds(),
            vec![
                EventKind::RoundStarted,
                EventKind::GuessSubmitted,
                EventKind::RoundEnded,
                EventKind::AdvanceRoundRequested,
                EventKind::RoundStarted,
                EventKind::GuessSubmitted,
                EventKind::RoundEnded,
                EventKind::AdvanceRoundRequested,
                EventKind::GameEnded,
            ]
        );
        let Some(GameEvent::GameEnded(ended)) = buffer.last() else {
            panic!("Wrong event type");
        };
        assert_eq!(ended.0.total_score, 5000);
        assert_eq!(ended.0.round_count, 2);
    }

    #[test]
    fn test_ui_can_advance_from_round_ended_listener() {
        let bus = EventBus::new();
        let game = Game::install(&bus, pool(3), config(3)).unwrap();

        // An auto-advancing UI: re-entrant emits must not trip the RefCell
        let bus_clone = bus.clone();
        bus.on::<RoundEnded>(move |_| bus_clone.emit(AdvanceRoundRequested));

        for _ in 0..3 {
            bus.emit(GuessSubmitted(far_away()));
        }

        assert!(game.borrow().is_ended());
        assert_eq!(game.borrow().completed_rounds(), 3);
    }

    #[test]
    fn test_restart_via_bus() {
        let bus = EventBus::new();
        let game = Game::install(&bus, pool(3), config(1)).unwrap();

        // Restart before the end is rejected and changes nothing
        bus.emit(RestartRequested);
        assert_eq!(game.borrow().phase(), GamePhase::RoundInProgress);

        bus.emit(GuessSubmitted(far_away()));
        bus.emit(AdvanceRoundRequested);
        assert!(game.borrow().is_ended());

        // Stale submit after the end is ignored
        bus.emit(GuessSubmitted(far_away()));

        bus.emit(RestartRequested);
        let game = game.borrow();
        assert_eq!(game.phase(), GamePhase::RoundInProgress);
        assert_eq!(game.completed_rounds(), 0);
    }

    #[test]
    fn test_dropped_game_stops_listening() {
        let bus = EventBus::new();
        let game = Game::install(&bus, pool(3), config(1)).unwrap();
        drop(game);
        // Listeners see a dead weak reference and do nothing
        bus.emit(GuessSubmitted(far_away()));
        bus.emit(AdvanceRoundRequested);
    }
}

use std::time::{Duration, Instant};

use crate::strategy::Strategy;
use hearts_core::game::result::{GameResult, PlayerIdentity};
use hearts_core::game::state::{Game, GameError, GamePhase, GameRules};
use hearts_core::game::view::Decision;
use hearts_core::model::card::Card;
use hearts_core::model::player::Seat;
use hearts_core::model::rules::PlayError;
use thiserror::Error;
use tracing::{Level, event};

/// A named player and the strategy that acts for it.
pub struct SeatConfig {
    pub name: String,
    pub strategy: Box<dyn Strategy>,
}

impl SeatConfig {
    pub fn new(name: impl Into<String>, strategy: Box<dyn Strategy>) -> Self {
        Self {
            name: name.into(),
            strategy,
        }
    }
}

/// Runs one game from deal to result, asking each seat's strategy for moves.
pub struct GameDriver {
    game: Game,
    seats: [SeatConfig; 4],
    metrics: [DecisionMetrics; 4],
}

/// Everything a finished game produced.
pub struct GameRun {
    pub result: GameResult,
    pub decisions: Vec<Decision>,
    pub timings: [DecisionSummary; 4],
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("game {game_id}: {strategy} at {seat} chose {card}, which is not a legal move")]
    StrategyViolation {
        game_id: u64,
        seat: Seat,
        strategy: String,
        card: Card,
    },
    #[error("game {game_id}: move {card} by {seat} rejected: {source}")]
    IllegalMove {
        game_id: u64,
        seat: Seat,
        card: Card,
        #[source]
        source: PlayError,
    },
    #[error("game {game_id}: {source}")]
    Game {
        game_id: u64,
        #[source]
        source: GameError,
    },
}

impl DriverError {
    pub fn game_id(&self) -> u64 {
        match self {
            DriverError::StrategyViolation { game_id, .. }
            | DriverError::IllegalMove { game_id, .. }
            | DriverError::Game { game_id, .. } => *game_id,
        }
    }
}

impl GameDriver {
    pub fn new(game_id: u64, seed: u64, rules: GameRules, seats: [SeatConfig; 4]) -> Self {
        Self {
            game: Game::new(game_id, seed, rules),
            seats,
            metrics: Default::default(),
        }
    }

    pub fn run(mut self) -> Result<GameRun, DriverError> {
        let game_id = self.game.id();
        let mut decisions = Vec::new();

        loop {
            match self.game.phase() {
                GamePhase::Finished => break,
                GamePhase::RoundComplete => {
                    let finished_round = self.game.round_number();
                    let phase = self
                        .game
                        .advance_round()
                        .map_err(|source| DriverError::Game { game_id, source })?;
                    let finished = phase == GamePhase::Finished;
                    event!(
                        target: "hearts_bot::driver",
                        Level::DEBUG,
                        game_id,
                        round = finished_round,
                        scores = ?self.game.scores().standings(),
                        finished,
                    );
                    continue;
                }
                GamePhase::InProgress => {}
            }

            let (Some(view), legal) = (self.game.visible_state(), self.game.legal_moves()) else {
                return Err(DriverError::Game {
                    game_id,
                    source: GameError::GameFinished,
                });
            };
            let seat = view.seat;
            let slot = &mut self.seats[seat.index()];

            let start = Instant::now();
            let card = slot.strategy.choose(&view, &legal);
            self.metrics[seat.index()].record(start.elapsed());

            if !legal.contains(&card) {
                let strategy = slot.strategy.id().to_string();
                event!(
                    target: "hearts_bot::driver",
                    Level::WARN,
                    game_id,
                    seat = %seat,
                    strategy = %strategy,
                    card = %card,
                    "strategy returned an illegal card"
                );
                return Err(DriverError::StrategyViolation {
                    game_id,
                    seat,
                    strategy,
                    card,
                });
            }

            self.game
                .apply_move(card)
                .map_err(|source| DriverError::IllegalMove {
                    game_id,
                    seat,
                    card,
                    source,
                })?;
            decisions.push(Decision { state: view, card });
        }

        let identities = self.seats.map(|seat| PlayerIdentity {
            strategy: seat.strategy.id().to_string(),
            name: seat.name,
        });
        let timings = self.metrics.map(DecisionMetrics::finalize);
        let result = self
            .game
            .into_result(identities)
            .map_err(|source| DriverError::Game { game_id, source })?;

        event!(
            target: "hearts_bot::driver",
            Level::INFO,
            game_id,
            rounds = result.rounds.len(),
            decisions = decisions.len(),
            winner = %result.winner,
        );

        Ok(GameRun {
            result,
            decisions,
            timings,
        })
    }
}

#[derive(Debug, Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) {
        self.total += duration;
        self.decisions += 1;
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
}

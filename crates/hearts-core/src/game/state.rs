use crate::game::result::{GameResult, PlayerIdentity, PlayerRecord, RoundRecord};
use crate::game::view::VisibleState;
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::player::Seat;
use crate::model::round::{PlayOutcome, RoundState};
use crate::model::rules::PlayError;
use crate::model::score::{ScoreBoard, TieBreak};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_END_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Game ends once any score reaches this. `0` plays a single round.
    pub end_score: u32,
    pub tie_break: TieBreak,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            end_score: DEFAULT_END_SCORE,
            tie_break: TieBreak::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    InProgress,
    RoundComplete,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    RoundInProgress,
    GameFinished,
    GameNotFinished,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::RoundInProgress => write!(f, "the current round still has cards to play"),
            GameError::GameFinished => write!(f, "the game is already finished"),
            GameError::GameNotFinished => write!(f, "the game has not finished yet"),
        }
    }
}

impl std::error::Error for GameError {}

#[derive(Debug, Clone)]
pub struct Game {
    id: u64,
    seed: u64,
    rules: GameRules,
    scores: ScoreBoard,
    round_number: u32,
    current_round: RoundState,
    completed_rounds: Vec<RoundRecord>,
    rng: StdRng,
    finished: bool,
}

impl Game {
    pub fn new(id: u64, seed: u64, rules: GameRules) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let deck = Deck::shuffled(&mut rng);
        Self {
            id,
            seed,
            rules,
            scores: ScoreBoard::new(),
            round_number: 1,
            current_round: RoundState::deal(&deck),
            completed_rounds: Vec::new(),
            rng,
            finished: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn round(&self) -> &RoundState {
        &self.current_round
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn completed_rounds(&self) -> &[RoundRecord] {
        &self.completed_rounds
    }

    pub fn phase(&self) -> GamePhase {
        if self.finished {
            GamePhase::Finished
        } else if self.current_round.is_complete() {
            GamePhase::RoundComplete
        } else {
            GamePhase::InProgress
        }
    }

    pub fn current_player(&self) -> Option<Seat> {
        if self.finished {
            return None;
        }
        self.current_round.current_player()
    }

    pub fn legal_moves(&self) -> Vec<Card> {
        match self.current_player() {
            Some(seat) => self.current_round.legal_moves(seat),
            None => Vec::new(),
        }
    }

    /// Snapshot for the seat to act, `None` when nobody is to act.
    pub fn visible_state(&self) -> Option<VisibleState> {
        let seat = self.current_player()?;
        Some(VisibleState {
            game_id: self.id,
            round_number: self.round_number,
            seat,
            hand: self.current_round.hand(seat).to_vec(),
            previous_tricks: self.current_round.trick_history().to_vec(),
            current_trick: self.current_round.current_trick().clone(),
            scores: *self.scores.standings(),
        })
    }

    /// Plays `card` for the seat to act. Trick points are scored as soon as the trick resolves.
    pub fn apply_move(&mut self, card: Card) -> Result<PlayOutcome, PlayError> {
        let seat = self.current_player().ok_or(PlayError::RoundComplete)?;
        let outcome = self.current_round.play_card(seat, card)?;
        if let PlayOutcome::TrickCompleted { winner, points } = outcome {
            self.scores.add_points(winner, points as u32);
        }
        Ok(outcome)
    }

    /// Archives the finished round, then deals the next one or ends the game.
    pub fn advance_round(&mut self) -> Result<GamePhase, GameError> {
        match self.phase() {
            GamePhase::Finished => return Err(GameError::GameFinished),
            GamePhase::InProgress => return Err(GameError::RoundInProgress),
            GamePhase::RoundComplete => {}
        }

        let penalties = self.current_round.penalty_totals();
        let initial_hands = self
            .current_round
            .initial_hands()
            .clone()
            .map(|hand| hand.to_vec());
        self.completed_rounds.push(RoundRecord {
            number: self.round_number,
            initial_hands,
            tricks: self.current_round.trick_history().to_vec(),
            points: penalties.map(u32::from),
        });

        if self.rules.end_score == 0 || self.scores.max_score() >= self.rules.end_score {
            self.finished = true;
            return Ok(GamePhase::Finished);
        }

        self.round_number += 1;
        let deck = Deck::shuffled(&mut self.rng);
        self.current_round = RoundState::deal(&deck);
        Ok(GamePhase::InProgress)
    }

    pub fn winner(&self) -> Seat {
        self.scores.winner(self.rules.tie_break)
    }

    pub fn into_result(self, players: [PlayerIdentity; 4]) -> Result<GameResult, GameError> {
        if !self.finished {
            return Err(GameError::GameNotFinished);
        }
        let winner = self.winner();
        let players = Seat::LOOP
            .iter()
            .copied()
            .zip(players)
            .map(|(seat, identity)| PlayerRecord {
                seat,
                name: identity.name,
                strategy: identity.strategy,
                score: self.scores.score(seat),
            })
            .collect();
        Ok(GameResult {
            game_id: self.id,
            seed: self.seed,
            players,
            rounds: self.completed_rounds,
            winner,
        })
    }
}

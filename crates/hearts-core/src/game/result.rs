use crate::model::card::Card;
use crate::model::player::Seat;
use crate::model::trick::CompletedTrick;
use serde::{Deserialize, Serialize};

/// Display name and strategy id for a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub name: String,
    pub strategy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub seat: Seat,
    pub name: String,
    pub strategy: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub number: u32,
    pub initial_hands: [Vec<Card>; 4],
    pub tricks: Vec<CompletedTrick>,
    pub points: [u32; 4],
}

impl RoundRecord {
    pub fn points_for(&self, seat: Seat) -> u32 {
        self.points[seat.index()]
    }
}

/// A finished game, complete enough to replay every move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub game_id: u64,
    pub seed: u64,
    pub players: Vec<PlayerRecord>,
    pub rounds: Vec<RoundRecord>,
    pub winner: Seat,
}

impl GameResult {
    pub fn final_scores(&self) -> [u32; 4] {
        let mut scores = [0u32; 4];
        for player in &self.players {
            scores[player.seat.index()] = player.score;
        }
        scores
    }

    pub fn total_tricks(&self) -> usize {
        self.rounds.iter().map(|round| round.tricks.len()).sum()
    }
}

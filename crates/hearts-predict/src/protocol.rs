//! Version 1 of the prediction wire format.
//!
//! Every message is a single JSON object. Unknown fields are rejected so a
//! caller speaking another shape of the schema fails loudly instead of being
//! half understood.

use hearts_core::game::view::VisibleState;
use hearts_core::model::card::Card;
use hearts_core::model::player::Seat;
use hearts_core::model::trick::{CompletedTrick, Trick};
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;

/// Round reported by [`PredictRequest::view`]; requests do not say which round
/// they belong to.
pub const PLACEHOLDER_ROUND: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictRequest {
    pub version: u32,
    pub state: PredictState,
    pub valid_moves: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictState {
    pub game_id: u64,
    /// 1-based; always `previous_tricks.len() + 1`.
    pub trick_number: u32,
    pub previous_tricks: Vec<CompletedTrick>,
    pub current_trick: Trick,
    pub current_player_index: Seat,
    pub player_hand: Vec<Card>,
    #[serde(default)]
    pub played_card: Option<Card>,
}

impl PredictRequest {
    /// Builds a request for the seat described by `view`.
    pub fn from_view(view: &VisibleState, valid_moves: &[Card]) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            state: PredictState {
                game_id: view.game_id,
                trick_number: view.trick_number() as u32,
                previous_tricks: view.previous_tricks.clone(),
                current_trick: view.current_trick.clone(),
                current_player_index: view.seat,
                player_hand: view.hand.clone(),
                played_card: None,
            },
            valid_moves: valid_moves.to_vec(),
        }
    }

    /// The request as a strategy snapshot. Scores are the points taken so far
    /// this round, since the request carries no game totals.
    ///
    /// The v1 schema has no round field either, so `round_number` is always
    /// [`PLACEHOLDER_ROUND`] whatever round the request came from.
    pub fn view(&self) -> VisibleState {
        let state = &self.state;
        let mut scores = [0u32; 4];
        for trick in &state.previous_tricks {
            scores[trick.winner().index()] += u32::from(trick.points());
        }
        VisibleState {
            game_id: state.game_id,
            round_number: PLACEHOLDER_ROUND,
            seat: state.current_player_index,
            hand: state.player_hand.clone(),
            previous_tricks: state.previous_tricks.clone(),
            current_trick: state.current_trick.clone(),
            scores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub card: Card,
    #[serde(default, skip_serializing_if = "is_false")]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PredictResponse {
    pub fn answered(card: Card) -> Self {
        Self {
            card,
            degraded: false,
            reason: None,
        }
    }

    pub fn fallback(card: Card, reason: impl Into<String>) -> Self {
        Self {
            card,
            degraded: true,
            reason: Some(reason.into()),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                kind: kind.into(),
                message: message.into(),
            },
        }
    }
}

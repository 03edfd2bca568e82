use hearts_core::game::view::Decision;
use hearts_core::model::card::Card;
use hearts_core::model::player::Seat;
use hearts_core::model::trick::{CompletedTrick, Trick};
use serde::{Deserialize, Serialize};

/// One labelled move: what the player knew, and the card it played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingExample {
    pub game_id: u64,
    pub round_number: u32,
    pub trick_number: u32,
    pub previous_tricks: Vec<CompletedTrick>,
    pub current_trick: Trick,
    #[serde(rename = "current_player_index")]
    pub seat: Seat,
    /// Hand at decision time, including `played_card`.
    #[serde(rename = "player_hand")]
    pub hand: Vec<Card>,
    pub played_card: Card,
}

impl TrainingExample {
    pub fn from_decision(decision: &Decision) -> Self {
        let state = &decision.state;
        Self {
            game_id: state.game_id,
            round_number: state.round_number,
            trick_number: state.trick_number() as u32,
            previous_tricks: state.previous_tricks.clone(),
            current_trick: state.current_trick.clone(),
            seat: state.seat,
            hand: state.hand.clone(),
            played_card: decision.card,
        }
    }
}

use crate::model::card::Card;
use crate::model::player::Seat;
use crate::model::rules;
use crate::model::trick::{CompletedTrick, Trick};
use serde::{Deserialize, Serialize};

/// What the acting seat is allowed to see when choosing a card.
///
/// Built as an owned copy so strategies can never reach into live game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleState {
    pub game_id: u64,
    pub round_number: u32,
    pub seat: Seat,
    pub hand: Vec<Card>,
    pub previous_tricks: Vec<CompletedTrick>,
    pub current_trick: Trick,
    pub scores: [u32; 4],
}

impl VisibleState {
    /// 1-based number of the trick being played.
    pub fn trick_number(&self) -> usize {
        self.previous_tricks.len() + 1
    }

    pub fn is_first_trick(&self) -> bool {
        self.previous_tricks.is_empty()
    }

    pub fn is_leading(&self) -> bool {
        self.current_trick.is_empty()
    }

    pub fn hearts_broken(&self) -> bool {
        self.played_cards().any(|card| card.suit.is_heart())
    }

    pub fn legal_moves(&self) -> Vec<Card> {
        rules::legal_moves(
            &self.hand,
            &self.current_trick,
            self.is_first_trick(),
            self.hearts_broken(),
        )
    }

    /// Every card seen this round, completed tricks first.
    pub fn played_cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.previous_tricks
            .iter()
            .flat_map(|trick| trick.plays().iter().map(|play| play.card))
            .chain(self.current_trick.plays().iter().map(|play| play.card))
    }

    /// Points `seat` has taken in the round so far.
    pub fn round_points(&self, seat: Seat) -> u32 {
        self.previous_tricks
            .iter()
            .filter(|trick| trick.winner() == seat)
            .map(|trick| trick.points() as u32)
            .sum()
    }
}

/// One move as the driver saw it: the pre-move view and the card chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub state: VisibleState,
    pub card: Card,
}

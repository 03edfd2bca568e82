use super::{Strategy, log_choice};
use hearts_core::game::view::VisibleState;
use hearts_core::model::card::Card;
use std::cmp::Reverse;

/// Highest rank wins; equal ranks go to the lowest suit (C < D < H < S).
pub struct AggressiveStrategy;

impl Strategy for AggressiveStrategy {
    fn id(&self) -> &str {
        "aggressive"
    }

    fn choose(&mut self, view: &VisibleState, legal: &[Card]) -> Card {
        let chosen = legal
            .iter()
            .copied()
            .max_by_key(|card| (card.rank, Reverse(card.suit)))
            .unwrap_or(legal[0]);
        log_choice(view, self.id(), legal, chosen, "highest_rank");
        chosen
    }
}

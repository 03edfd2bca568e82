use super::{Strategy, log_choice};
use hearts_core::game::view::VisibleState;
use hearts_core::model::card::Card;
use hearts_core::model::deck::Deck;
use std::collections::VecDeque;

/// Plays back a fixed card sequence, one card per call.
///
/// An exhausted script answers with a card outside `legal`, so the driver
/// reports the mismatch instead of the game silently diverging.
pub struct ReplayStrategy {
    script: VecDeque<Card>,
}

impl ReplayStrategy {
    pub fn new(script: impl IntoIterator<Item = Card>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Strategy for ReplayStrategy {
    fn id(&self) -> &str {
        "replay"
    }

    fn choose(&mut self, view: &VisibleState, legal: &[Card]) -> Card {
        if let Some(card) = self.script.pop_front() {
            log_choice(view, self.id(), legal, card, "scripted");
            return card;
        }

        tracing::warn!(
            target: "hearts_bot::strategy",
            game_id = view.game_id,
            seat = %view.seat,
            "replay script exhausted"
        );
        Deck::standard()
            .cards()
            .iter()
            .copied()
            .find(|card| !legal.contains(card))
            .unwrap_or(Card::TWO_OF_CLUBS)
    }
}

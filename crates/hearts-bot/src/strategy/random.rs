use super::{Strategy, log_choice};
use hearts_core::game::view::VisibleState;
use hearts_core::model::card::Card;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Uniform choice among legal moves.
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Strategy for RandomStrategy {
    fn id(&self) -> &str {
        "random"
    }

    fn choose(&mut self, view: &VisibleState, legal: &[Card]) -> Card {
        let chosen = *legal.choose(&mut self.rng).unwrap_or(&legal[0]);
        log_choice(view, self.id(), legal, chosen, "uniform");
        chosen
    }
}

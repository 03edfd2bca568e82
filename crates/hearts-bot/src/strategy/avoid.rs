use super::{Strategy, log_choice};
use hearts_core::game::view::VisibleState;
use hearts_core::model::card::Card;

/// Keeps points away from its own pile.
///
/// When it can follow or lead, it plays the lowest card, counting penalty
/// cards as 13 ranks higher so they are kept back. When void in the led suit
/// it sheds the most dangerous card instead: Q♠, then its highest heart, then
/// its highest card.
pub struct AvoidPointsStrategy;

impl Strategy for AvoidPointsStrategy {
    fn id(&self) -> &str {
        "avoid_points"
    }

    fn choose(&mut self, view: &VisibleState, legal: &[Card]) -> Card {
        let (chosen, reason) = match view.current_trick.lead_suit() {
            Some(lead) if !legal.iter().any(|card| card.suit == lead) => (discard(legal), "discard"),
            _ => (lowest_risk(legal), "lowest_risk"),
        };
        log_choice(view, self.id(), legal, chosen, reason);
        chosen
    }
}

fn risk(card: &Card) -> u8 {
    if card.is_penalty() {
        card.rank.value() + 13
    } else {
        card.rank.value()
    }
}

fn lowest_risk(legal: &[Card]) -> Card {
    legal.iter().copied().min_by_key(risk).unwrap_or(legal[0])
}

fn discard(legal: &[Card]) -> Card {
    if legal.contains(&Card::QUEEN_OF_SPADES) {
        return Card::QUEEN_OF_SPADES;
    }
    let highest_heart = legal
        .iter()
        .copied()
        .filter(|card| card.suit.is_heart())
        .max_by_key(|card| card.rank);
    highest_heart
        .or_else(|| legal.iter().copied().max_by_key(|card| card.rank))
        .unwrap_or(legal[0])
}

#[cfg(test)]
mod tests {
    use super::AvoidPointsStrategy;
    use crate::strategy::Strategy;
    use crate::strategy::fixtures::view;
    use hearts_core::model::card::Card;
    use hearts_core::model::player::Seat;
    use hearts_core::model::rank::Rank;
    use hearts_core::model::suit::Suit;
    use hearts_core::model::trick::Trick;

    #[test]
    fn leads_lowest_non_penalty_card() {
        let legal = vec![
            Card::new(Rank::Two, Suit::Hearts),
            Card::new(Rank::Nine, Suit::Diamonds),
            Card::new(Rank::Five, Suit::Spades),
        ];
        let state = view(Seat::LOOP[0], legal.clone(), Vec::new(), Trick::new(Seat::LOOP[0]));
        assert_eq!(
            AvoidPointsStrategy.choose(&state, &legal),
            Card::new(Rank::Five, Suit::Spades)
        );
    }

    #[test]
    fn void_follower_dumps_queen_of_spades_first() {
        let legal = vec![
            Card::new(Rank::Ace, Suit::Hearts),
            Card::QUEEN_OF_SPADES,
            Card::new(Rank::Three, Suit::Diamonds),
        ];
        let mut trick = Trick::new(Seat::LOOP[3]);
        trick.play(Seat::LOOP[3], Card::new(Rank::Six, Suit::Clubs)).unwrap();
        let state = view(Seat::LOOP[0], legal.clone(), Vec::new(), trick);
        assert_eq!(AvoidPointsStrategy.choose(&state, &legal), Card::QUEEN_OF_SPADES);
    }

    #[test]
    fn void_follower_without_queen_sheds_high_heart() {
        let legal = vec![
            Card::new(Rank::Four, Suit::Hearts),
            Card::new(Rank::Jack, Suit::Hearts),
            Card::new(Rank::King, Suit::Diamonds),
        ];
        let mut trick = Trick::new(Seat::LOOP[3]);
        trick.play(Seat::LOOP[3], Card::new(Rank::Six, Suit::Spades)).unwrap();
        let state = view(Seat::LOOP[0], legal.clone(), Vec::new(), trick);
        assert_eq!(
            AvoidPointsStrategy.choose(&state, &legal),
            Card::new(Rank::Jack, Suit::Hearts)
        );
    }
}

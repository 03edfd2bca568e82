use super::{Strategy, log_choice};
use hearts_core::game::view::VisibleState;
use hearts_core::model::card::Card;
use hearts_core::model::suit::Suit;

/// Suit-count heuristic.
///
/// Tracks how many cards of each suit are accounted for (own hand plus
/// everything played this round). Hearts are never a target suit, and spades
/// are avoided until Q♠ has fallen. Short suits are led high while plenty of
/// cards remain out; tricks are only taken when they are clean and the suit
/// is still fresh.
pub struct TacticalStrategy;

const LEAD_LOW_THRESHOLD: u8 = 7;

impl Strategy for TacticalStrategy {
    fn id(&self) -> &str {
        "tactical"
    }

    fn choose(&mut self, view: &VisibleState, legal: &[Card]) -> Card {
        let (preferred, reason) = pick(view, legal);
        let chosen = if legal.contains(&preferred) {
            preferred
        } else {
            legal[0]
        };
        let reason = if chosen == preferred { reason } else { "first_legal" };
        log_choice(view, self.id(), legal, chosen, reason);
        chosen
    }
}

fn pick(view: &VisibleState, legal: &[Card]) -> (Card, &'static str) {
    if view.is_first_trick() && view.is_leading() && legal.contains(&Card::TWO_OF_CLUBS) {
        return (Card::TWO_OF_CLUBS, "open_two_of_clubs");
    }

    let mut accounted = [0u8; 4];
    for card in view.hand.iter().copied().chain(view.played_cards()) {
        accounted[card.suit.index()] += 1;
    }

    let queen_fallen = view
        .previous_tricks
        .iter()
        .any(|trick| trick.contains(Card::QUEEN_OF_SPADES));
    let excluded = |suit: Suit| suit == Suit::Hearts || (suit == Suit::Spades && !queen_fallen);

    let Some(lead) = view.current_trick.lead_suit() else {
        let target = Suit::ALL
            .iter()
            .copied()
            .filter(|suit| accounted[suit.index()] > 0 && !excluded(*suit))
            .min_by_key(|suit| accounted[suit.index()])
            .unwrap_or(Suit::Clubs);
        let in_suit = suit_cards(&view.hand, target);
        return if accounted[target.index()] > LEAD_LOW_THRESHOLD {
            let card = in_suit.first().or(view.hand.first()).copied();
            (card.unwrap_or(legal[0]), "lead_low")
        } else {
            let card = in_suit.last().or(view.hand.last()).copied();
            (card.unwrap_or(legal[0]), "lead_high")
        };
    };

    let in_suit = suit_cards(&view.hand, lead);
    if let Some(highest_mine) = in_suit.last().copied() {
        let trick_high = view
            .current_trick
            .plays()
            .iter()
            .filter(|play| play.card.suit == lead)
            .map(|play| play.card.rank)
            .max();
        let take = view.current_trick.penalty_total() == 0
            && accounted[lead.index()] < LEAD_LOW_THRESHOLD
            && !excluded(lead);
        if take {
            return (highest_mine, "take_clean_trick");
        }
        let under = in_suit
            .iter()
            .copied()
            .filter(|card| trick_high.is_some_and(|high| card.rank < high))
            .next_back();
        return match under {
            Some(card) => (card, "duck_under"),
            None => (highest_mine, "forced_over"),
        };
    }

    if view.hand.contains(&Card::QUEEN_OF_SPADES) {
        return (Card::QUEEN_OF_SPADES, "dump_queen");
    }
    match suit_cards(&view.hand, Suit::Hearts).last() {
        Some(card) => (*card, "dump_heart"),
        None => (legal[0], "first_legal"),
    }
}

fn suit_cards(hand: &[Card], suit: Suit) -> Vec<Card> {
    let mut cards: Vec<Card> = hand.iter().copied().filter(|c| c.suit == suit).collect();
    cards.sort_by_key(|card| card.rank);
    cards
}

#[cfg(test)]
mod tests {
    use super::TacticalStrategy;
    use crate::strategy::Strategy;
    use crate::strategy::fixtures::view;
    use hearts_core::model::card::Card;
    use hearts_core::model::player::Seat;
    use hearts_core::model::rank::Rank;
    use hearts_core::model::suit::Suit;
    use hearts_core::model::trick::{CompletedTrick, Trick};

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn clean_club_trick() -> CompletedTrick {
        CompletedTrick::from_cards(
            Seat::LOOP[0],
            [
                Card::TWO_OF_CLUBS,
                c(Rank::Three, Suit::Clubs),
                c(Rank::Four, Suit::Clubs),
                c(Rank::Five, Suit::Clubs),
            ],
        )
    }

    #[test]
    fn opens_with_two_of_clubs() {
        let hand = vec![Card::TWO_OF_CLUBS, c(Rank::Ace, Suit::Diamonds)];
        let state = view(Seat::LOOP[0], hand, Vec::new(), Trick::new(Seat::LOOP[0]));
        assert_eq!(
            TacticalStrategy.choose(&state, &[Card::TWO_OF_CLUBS]),
            Card::TWO_OF_CLUBS
        );
    }

    #[test]
    fn leads_high_in_short_safe_suit() {
        let hand = vec![
            c(Rank::Nine, Suit::Diamonds),
            c(Rank::Queen, Suit::Diamonds),
            c(Rank::Six, Suit::Clubs),
            c(Rank::Three, Suit::Hearts),
        ];
        let state = view(
            Seat::LOOP[0],
            hand.clone(),
            vec![clean_club_trick()],
            Trick::new(Seat::LOOP[0]),
        );
        // clubs: 1 in hand + 4 played = 5, diamonds: 2, so diamonds is the target
        let legal: Vec<Card> = hand.iter().copied().filter(|c| !c.suit.is_heart()).collect();
        assert_eq!(
            TacticalStrategy.choose(&state, &legal),
            c(Rank::Queen, Suit::Diamonds)
        );
    }

    #[test]
    fn ducks_under_when_trick_carries_points() {
        let hand = vec![
            c(Rank::Two, Suit::Diamonds),
            c(Rank::Ten, Suit::Diamonds),
            c(Rank::Ace, Suit::Diamonds),
        ];
        let mut trick = Trick::new(Seat::LOOP[2]);
        trick.play(Seat::LOOP[2], c(Rank::Jack, Suit::Diamonds)).unwrap();
        trick.play(Seat::LOOP[3], c(Rank::Five, Suit::Hearts)).unwrap();
        let state = view(Seat::LOOP[0], hand.clone(), vec![clean_club_trick()], trick);
        assert_eq!(
            TacticalStrategy.choose(&state, &hand),
            c(Rank::Ten, Suit::Diamonds)
        );
    }

    #[test]
    fn takes_clean_fresh_trick_high() {
        let hand = vec![c(Rank::Two, Suit::Diamonds), c(Rank::Ace, Suit::Diamonds)];
        let mut trick = Trick::new(Seat::LOOP[3]);
        trick.play(Seat::LOOP[3], c(Rank::Jack, Suit::Diamonds)).unwrap();
        let state = view(Seat::LOOP[0], hand.clone(), vec![clean_club_trick()], trick);
        assert_eq!(
            TacticalStrategy.choose(&state, &hand),
            c(Rank::Ace, Suit::Diamonds)
        );
    }

    #[test]
    fn void_follower_dumps_queen_then_hearts() {
        let hand = vec![Card::QUEEN_OF_SPADES, c(Rank::King, Suit::Hearts)];
        let mut trick = Trick::new(Seat::LOOP[3]);
        trick.play(Seat::LOOP[3], c(Rank::Jack, Suit::Diamonds)).unwrap();
        let state = view(Seat::LOOP[0], hand.clone(), vec![clean_club_trick()], trick.clone());
        assert_eq!(TacticalStrategy.choose(&state, &hand), Card::QUEEN_OF_SPADES);

        let hand = vec![c(Rank::Four, Suit::Hearts), c(Rank::King, Suit::Hearts)];
        let state = view(Seat::LOOP[0], hand.clone(), vec![clean_club_trick()], trick);
        assert_eq!(
            TacticalStrategy.choose(&state, &hand),
            c(Rank::King, Suit::Hearts)
        );
    }

    #[test]
    fn illegal_preference_falls_back_to_first_legal() {
        let hand = vec![c(Rank::Nine, Suit::Diamonds), c(Rank::Three, Suit::Spades)];
        let state = view(
            Seat::LOOP[0],
            hand,
            vec![clean_club_trick()],
            Trick::new(Seat::LOOP[0]),
        );
        let legal = [c(Rank::Three, Suit::Spades)];
        assert_eq!(TacticalStrategy.choose(&state, &legal), legal[0]);
    }
}

use crate::model::card::Card;
use crate::model::player::Seat;
use crate::model::suit::Suit;
use crate::model::trick::Trick;
use std::fmt;

/// Why a card may not be played right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    CardNotInHand(Card),
    OutOfTurn { expected: Seat, actual: Seat },
    MustLeadTwoOfClubs,
    MustFollowSuit(Suit),
    HeartsNotBroken,
    NoPointsOnFirstTrick,
    RoundComplete,
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayError::CardNotInHand(card) => write!(f, "{card} is not in hand"),
            PlayError::OutOfTurn { expected, actual } => {
                write!(f, "{actual} played out of turn; {expected} is to play")
            }
            PlayError::MustLeadTwoOfClubs => write!(f, "the first trick must be led with 2C"),
            PlayError::MustFollowSuit(suit) => write!(f, "must follow suit {suit}"),
            PlayError::HeartsNotBroken => write!(f, "hearts have not been broken"),
            PlayError::NoPointsOnFirstTrick => {
                write!(f, "penalty cards cannot be played on the first trick")
            }
            PlayError::RoundComplete => write!(f, "all tricks of the round have been played"),
        }
    }
}

impl std::error::Error for PlayError {}

/// Cards `hand` may legally play into `trick`.
///
/// Returns an empty list only for an empty hand.
pub fn legal_moves(hand: &[Card], trick: &Trick, first_trick: bool, hearts_broken: bool) -> Vec<Card> {
    if hand.is_empty() {
        return Vec::new();
    }

    let candidates: Vec<Card> = match trick.lead_suit() {
        Some(suit) => {
            let following: Vec<Card> = hand.iter().copied().filter(|c| c.suit == suit).collect();
            if following.is_empty() {
                hand.to_vec()
            } else {
                following
            }
        }
        None => {
            if first_trick && hand.contains(&Card::TWO_OF_CLUBS) {
                return vec![Card::TWO_OF_CLUBS];
            }
            if hearts_broken {
                hand.to_vec()
            } else {
                let non_hearts: Vec<Card> =
                    hand.iter().copied().filter(|c| !c.suit.is_heart()).collect();
                if non_hearts.is_empty() {
                    hand.to_vec()
                } else {
                    non_hearts
                }
            }
        }
    };

    if first_trick {
        let clean: Vec<Card> = candidates.iter().copied().filter(|c| !c.is_penalty()).collect();
        if !clean.is_empty() {
            return clean;
        }
    }
    candidates
}

/// Explains why `card` is not among the legal moves, or `Ok` if it is.
pub fn check_play(
    hand: &[Card],
    trick: &Trick,
    first_trick: bool,
    hearts_broken: bool,
    card: Card,
) -> Result<(), PlayError> {
    if !hand.contains(&card) {
        return Err(PlayError::CardNotInHand(card));
    }

    let legal = legal_moves(hand, trick, first_trick, hearts_broken);
    if legal.contains(&card) {
        return Ok(());
    }

    match trick.lead_suit() {
        Some(suit) if card.suit != suit && hand.iter().any(|c| c.suit == suit) => {
            Err(PlayError::MustFollowSuit(suit))
        }
        Some(_) => Err(PlayError::NoPointsOnFirstTrick),
        None if first_trick && hand.contains(&Card::TWO_OF_CLUBS) => {
            Err(PlayError::MustLeadTwoOfClubs)
        }
        None if card.suit.is_heart() && !hearts_broken => Err(PlayError::HeartsNotBroken),
        None => Err(PlayError::NoPointsOnFirstTrick),
    }
}

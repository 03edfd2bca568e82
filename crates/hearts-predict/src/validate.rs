use std::collections::HashSet;

use hearts_core::model::card::Card;
use hearts_core::model::deck::HAND_SIZE;
use hearts_core::model::player::Seat;
use hearts_core::model::rules::{self, PlayError};
use hearts_core::model::trick::TrickError;
use thiserror::Error;

use crate::protocol::{PROTOCOL_VERSION, PredictRequest};

/// Why a request does not describe a reachable game position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("unsupported protocol version {0}; only version 1 is accepted")]
    UnsupportedVersion(u32),
    #[error("{0} previous tricks leave no card to play")]
    TooManyTricks(usize),
    #[error("trick_number is {actual} but {expected} tricks precede it")]
    TrickNumber { expected: u32, actual: u32 },
    #[error("previous trick {index}: {source}")]
    BadTrick {
        index: usize,
        #[source]
        source: TrickError,
    },
    #[error("current trick: {0}")]
    BadCurrentTrick(TrickError),
    #[error("trick {index} led by {actual} but {expected} won the trick before")]
    LeaderMismatch {
        index: usize,
        expected: Seat,
        actual: Seat,
    },
    #[error("the first trick must be led with 2C, found {0}")]
    FirstLeadNotTwoOfClubs(Card),
    #[error("{0} must lead 2C on the first trick but does not hold it")]
    MissingTwoOfClubs(Seat),
    #[error("current trick already holds four cards")]
    CurrentTrickFull,
    #[error("current_player_index is {actual} but {expected} is to play")]
    WrongPlayer { expected: Seat, actual: Seat },
    #[error("{0} appears more than once across hand and tricks")]
    DuplicateCard(Card),
    #[error("hand holds {actual} cards but {expected} remain at this point of the round")]
    HandSize { expected: usize, actual: usize },
    #[error("played_card {0} is not in player_hand")]
    PlayedCardNotInHand(Card),
    #[error("valid_moves is empty")]
    NoValidMoves,
    #[error("{0} listed more than once in valid_moves")]
    DuplicateValidMove(Card),
    #[error("listed valid move {card} is not legal: {source}")]
    IllegalValidMove {
        card: Card,
        #[source]
        source: PlayError,
    },
}

/// Checks that `request` is internally consistent and that every listed move
/// is legal for the embedded position. Does not mutate anything.
pub fn validate_request(request: &PredictRequest) -> Result<(), RequestError> {
    if request.version != PROTOCOL_VERSION {
        return Err(RequestError::UnsupportedVersion(request.version));
    }

    let state = &request.state;
    let previous = &state.previous_tricks;
    if previous.len() >= HAND_SIZE {
        return Err(RequestError::TooManyTricks(previous.len()));
    }
    let expected_number = previous.len() as u32 + 1;
    if state.trick_number != expected_number {
        return Err(RequestError::TrickNumber {
            expected: expected_number,
            actual: state.trick_number,
        });
    }

    for (index, trick) in previous.iter().enumerate() {
        trick
            .verify()
            .map_err(|source| RequestError::BadTrick { index, source })?;
        if index == 0 {
            if let Some(lead) = trick.plays().first().map(|play| play.card)
                && lead != Card::TWO_OF_CLUBS
            {
                return Err(RequestError::FirstLeadNotTwoOfClubs(lead));
            }
        } else {
            let expected = previous[index - 1].winner();
            if trick.leader() != expected {
                return Err(RequestError::LeaderMismatch {
                    index,
                    expected,
                    actual: trick.leader(),
                });
            }
        }
    }

    let current = &state.current_trick;
    current.verify().map_err(RequestError::BadCurrentTrick)?;
    if current.is_complete() {
        return Err(RequestError::CurrentTrickFull);
    }
    if let Some(last) = previous.last()
        && current.leader() != last.winner()
    {
        return Err(RequestError::LeaderMismatch {
            index: previous.len(),
            expected: last.winner(),
            actual: current.leader(),
        });
    }
    let expected_player = current.next_to_play();
    if state.current_player_index != expected_player {
        return Err(RequestError::WrongPlayer {
            expected: expected_player,
            actual: state.current_player_index,
        });
    }

    let mut seen = HashSet::new();
    let played = previous
        .iter()
        .flat_map(|trick| trick.plays().iter().map(|play| play.card))
        .chain(current.plays().iter().map(|play| play.card));
    for card in played.chain(state.player_hand.iter().copied()) {
        if !seen.insert(card) {
            return Err(RequestError::DuplicateCard(card));
        }
    }

    if previous.is_empty() {
        match current.plays().first() {
            Some(play) if play.card != Card::TWO_OF_CLUBS => {
                return Err(RequestError::FirstLeadNotTwoOfClubs(play.card));
            }
            None if !state.player_hand.contains(&Card::TWO_OF_CLUBS) => {
                return Err(RequestError::MissingTwoOfClubs(state.current_player_index));
            }
            _ => {}
        }
    }

    let expected_hand = HAND_SIZE - previous.len();
    if state.player_hand.len() != expected_hand {
        return Err(RequestError::HandSize {
            expected: expected_hand,
            actual: state.player_hand.len(),
        });
    }

    if let Some(card) = state.played_card
        && !state.player_hand.contains(&card)
    {
        return Err(RequestError::PlayedCardNotInHand(card));
    }

    validate_moves(request)
}

fn validate_moves(request: &PredictRequest) -> Result<(), RequestError> {
    if request.valid_moves.is_empty() {
        return Err(RequestError::NoValidMoves);
    }

    let state = &request.state;
    let first_trick = state.previous_tricks.is_empty();
    let hearts_broken = state
        .previous_tricks
        .iter()
        .flat_map(|trick| trick.plays())
        .chain(state.current_trick.plays())
        .any(|play| play.card.suit.is_heart());

    let mut listed = HashSet::new();
    for &card in &request.valid_moves {
        if !listed.insert(card) {
            return Err(RequestError::DuplicateValidMove(card));
        }
        rules::check_play(
            &state.player_hand,
            &state.current_trick,
            first_trick,
            hearts_broken,
            card,
        )
        .map_err(|source| RequestError::IllegalValidMove { card, source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{RequestError, validate_request};
    use crate::protocol::{PROTOCOL_VERSION, PredictRequest, PredictState};
    use hearts_core::model::card::Card;
    use hearts_core::model::player::Seat;
    use hearts_core::model::rank::Rank;
    use hearts_core::model::rules::PlayError;
    use hearts_core::model::suit::Suit;
    use hearts_core::model::trick::{CompletedTrick, Trick};

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn opening_trick() -> CompletedTrick {
        CompletedTrick::from_cards(
            Seat::LOOP[0],
            [
                Card::TWO_OF_CLUBS,
                card(Rank::Five, Suit::Clubs),
                card(Rank::King, Suit::Clubs),
                card(Rank::Three, Suit::Diamonds),
            ],
        )
    }

    /// Seat 2 won the opening trick and leads the second one.
    fn second_trick_request() -> PredictRequest {
        let hand = vec![
            card(Rank::Four, Suit::Clubs),
            card(Rank::Nine, Suit::Clubs),
            card(Rank::Two, Suit::Diamonds),
            card(Rank::Jack, Suit::Diamonds),
            card(Rank::Ace, Suit::Diamonds),
            card(Rank::Two, Suit::Spades),
            card(Rank::Six, Suit::Spades),
            card(Rank::Queen, Suit::Spades),
            card(Rank::Two, Suit::Hearts),
            card(Rank::Five, Suit::Hearts),
            card(Rank::Ten, Suit::Hearts),
            card(Rank::King, Suit::Hearts),
        ];
        PredictRequest {
            version: PROTOCOL_VERSION,
            state: PredictState {
                game_id: 3,
                trick_number: 2,
                previous_tricks: vec![opening_trick()],
                current_trick: Trick::new(Seat::LOOP[2]),
                current_player_index: Seat::LOOP[2],
                player_hand: hand,
                played_card: None,
            },
            valid_moves: vec![card(Rank::Four, Suit::Clubs), card(Rank::Queen, Suit::Spades)],
        }
    }

    #[test]
    fn accepts_consistent_request() {
        assert_eq!(validate_request(&second_trick_request()), Ok(()));
    }

    #[test]
    fn accepts_opening_lead() {
        let mut hand: Vec<Card> = (0..13u8)
            .map(|value| card(Rank::from_value(value % 13 + 2).unwrap(), Suit::Clubs))
            .collect();
        hand.sort();
        let request = PredictRequest {
            version: PROTOCOL_VERSION,
            state: PredictState {
                game_id: 1,
                trick_number: 1,
                previous_tricks: Vec::new(),
                current_trick: Trick::new(Seat::LOOP[3]),
                current_player_index: Seat::LOOP[3],
                player_hand: hand,
                played_card: Some(Card::TWO_OF_CLUBS),
            },
            valid_moves: vec![Card::TWO_OF_CLUBS],
        };
        assert_eq!(validate_request(&request), Ok(()));
    }

    #[test]
    fn rejects_other_versions() {
        let mut request = second_trick_request();
        request.version = 2;
        assert_eq!(validate_request(&request), Err(RequestError::UnsupportedVersion(2)));
    }

    #[test]
    fn rejects_card_in_hand_and_history() {
        let mut request = second_trick_request();
        request.state.player_hand[0] = card(Rank::King, Suit::Clubs);
        assert_eq!(
            validate_request(&request),
            Err(RequestError::DuplicateCard(card(Rank::King, Suit::Clubs)))
        );
    }

    #[test]
    fn rejects_hearts_lead_before_broken() {
        let mut request = second_trick_request();
        request.valid_moves.push(card(Rank::Two, Suit::Hearts));
        assert_eq!(
            validate_request(&request),
            Err(RequestError::IllegalValidMove {
                card: card(Rank::Two, Suit::Hearts),
                source: PlayError::HeartsNotBroken,
            })
        );
    }

    #[test]
    fn rejects_move_not_in_hand() {
        let mut request = second_trick_request();
        request.valid_moves = vec![card(Rank::Eight, Suit::Spades)];
        assert!(matches!(
            validate_request(&request),
            Err(RequestError::IllegalValidMove {
                source: PlayError::CardNotInHand(_),
                ..
            })
        ));
    }

    #[test]
    fn rejects_wrong_current_player() {
        let mut request = second_trick_request();
        request.state.current_player_index = Seat::LOOP[1];
        assert!(matches!(
            validate_request(&request),
            Err(RequestError::WrongPlayer { .. })
        ));
    }

    #[test]
    fn rejects_leader_that_did_not_win() {
        let mut request = second_trick_request();
        request.state.current_trick = Trick::new(Seat::LOOP[0]);
        request.state.current_player_index = Seat::LOOP[0];
        assert!(matches!(
            validate_request(&request),
            Err(RequestError::LeaderMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_tampered_trick_score() {
        let mut request = second_trick_request();
        let mut value = serde_json::to_value(&request).unwrap();
        value["state"]["previous_tricks"][0]["score"] = serde_json::json!(5);
        request = serde_json::from_value(value).unwrap();
        assert!(matches!(
            validate_request(&request),
            Err(RequestError::BadTrick { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_wrong_hand_size_and_trick_number() {
        let mut request = second_trick_request();
        request.state.player_hand.pop();
        assert_eq!(
            validate_request(&request),
            Err(RequestError::HandSize {
                expected: 12,
                actual: 11
            })
        );

        let mut request = second_trick_request();
        request.state.trick_number = 5;
        assert!(matches!(
            validate_request(&request),
            Err(RequestError::TrickNumber { expected: 2, actual: 5 })
        ));
    }

    #[test]
    fn rejects_played_card_outside_hand() {
        let mut request = second_trick_request();
        request.state.played_card = Some(card(Rank::Ace, Suit::Spades));
        assert_eq!(
            validate_request(&request),
            Err(RequestError::PlayedCardNotInHand(card(Rank::Ace, Suit::Spades)))
        );
    }

    #[test]
    fn rejects_empty_or_repeated_moves() {
        let mut request = second_trick_request();
        request.valid_moves.clear();
        assert_eq!(validate_request(&request), Err(RequestError::NoValidMoves));

        let mut request = second_trick_request();
        request.valid_moves.push(card(Rank::Four, Suit::Clubs));
        assert_eq!(
            validate_request(&request),
            Err(RequestError::DuplicateValidMove(card(Rank::Four, Suit::Clubs)))
        );
    }
}

use crate::model::card::Card;
use crate::model::player::Seat;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The trick being played. Seats that have not played yet simply have no entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trick {
    #[serde(rename = "cards")]
    plays: Vec<Play>,
    #[serde(rename = "first_player_index")]
    leader: Seat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Play {
    #[serde(rename = "player_index")]
    pub position: Seat,
    pub card: Card,
}

/// A resolved trick. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompletedTrick {
    #[serde(rename = "cards")]
    plays: Vec<Play>,
    #[serde(rename = "first_player_index")]
    leader: Seat,
    winner: Seat,
    #[serde(rename = "score")]
    points: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrickError {
    TrickComplete,
    OutOfTurn { expected: Seat, actual: Seat },
    AlreadyPlayed(Seat),
    Incomplete(usize),
    WinnerMismatch { recorded: Seat, actual: Seat },
    PointsMismatch { recorded: u8, actual: u8 },
}

impl fmt::Display for TrickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrickError::TrickComplete => write!(f, "trick already complete"),
            TrickError::OutOfTurn { expected, actual } => {
                write!(f, "expected {expected} to play next but got {actual}")
            }
            TrickError::AlreadyPlayed(position) => {
                write!(f, "{position} has already played this trick")
            }
            TrickError::Incomplete(count) => {
                write!(f, "completed trick holds {count} cards instead of 4")
            }
            TrickError::WinnerMismatch { recorded, actual } => {
                write!(f, "trick records winner {recorded} but {actual} won it")
            }
            TrickError::PointsMismatch { recorded, actual } => {
                write!(f, "trick records {recorded} points but holds {actual}")
            }
        }
    }
}

impl std::error::Error for TrickError {}

impl Trick {
    pub fn new(leader: Seat) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(4),
        }
    }

    pub fn leader(&self) -> Seat {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    /// Play at position `index` in play order, if it has been made.
    pub fn slot(&self, index: usize) -> Option<&Play> {
        self.plays.get(index)
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 4
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|play| play.card.suit)
    }

    pub fn contains(&self, card: Card) -> bool {
        self.plays.iter().any(|play| play.card == card)
    }

    pub fn play(&mut self, position: Seat, card: Card) -> Result<(), TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }

        if self.plays.iter().any(|play| play.position == position) {
            return Err(TrickError::AlreadyPlayed(position));
        }

        let expected = self.next_to_play();
        if expected != position {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: position,
            });
        }

        self.plays.push(Play { position, card });
        Ok(())
    }

    pub fn winner(&self) -> Option<Seat> {
        if !self.is_complete() {
            return None;
        }
        winning_play(&self.plays).map(|play| play.position)
    }

    pub fn penalty_total(&self) -> u8 {
        penalty_total(&self.plays)
    }

    /// Seat whose turn it is; the leader while the trick is empty.
    pub fn next_to_play(&self) -> Seat {
        self.plays
            .last()
            .map(|play| play.position.next())
            .unwrap_or(self.leader)
    }

    /// Checks that plays run in turn order from the leader with no repeats.
    pub fn verify(&self) -> Result<(), TrickError> {
        if self.plays.len() > 4 {
            return Err(TrickError::TrickComplete);
        }
        check_turn_order(self.leader, &self.plays)
    }

    pub fn resolve(&self) -> Option<CompletedTrick> {
        let winner = self.winner()?;
        Some(CompletedTrick {
            plays: self.plays.clone(),
            leader: self.leader,
            winner,
            points: self.penalty_total(),
        })
    }
}

impl CompletedTrick {
    /// Builds a resolved trick from four cards given in play order.
    pub fn from_cards(leader: Seat, cards: [Card; 4]) -> Self {
        let plays: Vec<Play> = cards
            .iter()
            .enumerate()
            .map(|(offset, card)| Play {
                position: leader.offset(offset),
                card: *card,
            })
            .collect();
        let winner = winning_play(&plays)
            .map(|play| play.position)
            .unwrap_or(leader);
        let points = penalty_total(&plays);
        Self {
            plays,
            leader,
            winner,
            points,
        }
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn leader(&self) -> Seat {
        self.leader
    }

    pub fn winner(&self) -> Seat {
        self.winner
    }

    pub fn points(&self) -> u8 {
        self.points
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|play| play.card.suit)
    }

    pub fn card_of(&self, seat: Seat) -> Option<Card> {
        self.plays
            .iter()
            .find(|play| play.position == seat)
            .map(|play| play.card)
    }

    pub fn contains(&self, card: Card) -> bool {
        self.plays.iter().any(|play| play.card == card)
    }

    /// Re-derives winner and points; a deserialized trick is only trusted after this.
    pub fn verify(&self) -> Result<(), TrickError> {
        if self.plays.len() != 4 {
            return Err(TrickError::Incomplete(self.plays.len()));
        }
        check_turn_order(self.leader, &self.plays)?;
        let actual = winning_play(&self.plays)
            .map(|play| play.position)
            .unwrap_or(self.leader);
        if actual != self.winner {
            return Err(TrickError::WinnerMismatch {
                recorded: self.winner,
                actual,
            });
        }
        let points = penalty_total(&self.plays);
        if points != self.points {
            return Err(TrickError::PointsMismatch {
                recorded: self.points,
                actual: points,
            });
        }
        Ok(())
    }
}

fn winning_play(plays: &[Play]) -> Option<&Play> {
    let lead_suit = plays.first()?.card.suit;
    plays
        .iter()
        .filter(|play| play.card.suit == lead_suit)
        .max_by(|a, b| a.card.rank.cmp(&b.card.rank))
}

fn penalty_total(plays: &[Play]) -> u8 {
    plays.iter().map(|play| play.card.penalty_value()).sum()
}

fn check_turn_order(leader: Seat, plays: &[Play]) -> Result<(), TrickError> {
    for (offset, play) in plays.iter().enumerate() {
        let expected = leader.offset(offset);
        if play.position != expected {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: play.position,
            });
        }
    }
    Ok(())
}

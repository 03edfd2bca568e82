use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::player::Seat;
use crate::model::rules::{self, PlayError};
use crate::model::trick::{CompletedTrick, Trick};

#[derive(Debug, Clone)]
pub struct RoundState {
    hands: [Hand; 4],
    initial_hands: [Hand; 4],
    current_trick: Trick,
    trick_history: Vec<CompletedTrick>,
    starting_player: Seat,
    hearts_broken: bool,
}

impl RoundState {
    /// Deals `deck` round-robin; the holder of 2C leads.
    pub fn deal(deck: &Deck) -> Self {
        Self::from_hands(deck.deal())
    }

    pub fn from_hands(hands: [Hand; 4]) -> Self {
        let starting_player = Seat::LOOP
            .iter()
            .copied()
            .find(|seat| hands[seat.index()].contains(Card::TWO_OF_CLUBS))
            .unwrap_or(Seat::LOOP[0]);

        Self {
            initial_hands: hands.clone(),
            hands,
            current_trick: Trick::new(starting_player),
            trick_history: Vec::new(),
            starting_player,
            hearts_broken: false,
        }
    }

    pub fn hand(&self, seat: Seat) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn initial_hand(&self, seat: Seat) -> &Hand {
        &self.initial_hands[seat.index()]
    }

    pub fn initial_hands(&self) -> &[Hand; 4] {
        &self.initial_hands
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn trick_history(&self) -> &[CompletedTrick] {
        &self.trick_history
    }

    pub fn starting_player(&self) -> Seat {
        self.starting_player
    }

    pub fn tricks_completed(&self) -> usize {
        self.trick_history.len()
    }

    pub fn hearts_broken(&self) -> bool {
        self.hearts_broken
    }

    pub fn is_first_trick(&self) -> bool {
        self.trick_history.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.current_trick.is_empty() && self.hands.iter().all(Hand::is_empty)
    }

    /// Seat to act next, `None` once every card has been played.
    pub fn current_player(&self) -> Option<Seat> {
        if self.is_complete() {
            None
        } else {
            Some(self.current_trick.next_to_play())
        }
    }

    /// Legal cards for `seat`; empty when it is not that seat's turn.
    pub fn legal_moves(&self, seat: Seat) -> Vec<Card> {
        if self.current_player() != Some(seat) {
            return Vec::new();
        }
        rules::legal_moves(
            self.hands[seat.index()].cards(),
            &self.current_trick,
            self.is_first_trick(),
            self.hearts_broken,
        )
    }

    pub fn check_play(&self, seat: Seat, card: Card) -> Result<(), PlayError> {
        let expected = self.current_player().ok_or(PlayError::RoundComplete)?;
        if expected != seat {
            return Err(PlayError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        rules::check_play(
            self.hands[seat.index()].cards(),
            &self.current_trick,
            self.is_first_trick(),
            self.hearts_broken,
            card,
        )
    }

    pub fn play_card(&mut self, seat: Seat, card: Card) -> Result<PlayOutcome, PlayError> {
        self.check_play(seat, card)?;

        self.current_trick
            .play(seat, card)
            .map_err(|_| PlayError::OutOfTurn {
                expected: self.current_trick.next_to_play(),
                actual: seat,
            })?;
        self.hands[seat.index()].remove(card);
        if card.suit.is_heart() {
            self.hearts_broken = true;
        }

        match self.current_trick.resolve() {
            Some(done) => {
                let winner = done.winner();
                let points = done.points();
                self.trick_history.push(done);
                self.current_trick = Trick::new(winner);
                Ok(PlayOutcome::TrickCompleted { winner, points })
            }
            None => Ok(PlayOutcome::Played),
        }
    }

    /// Points taken so far this round, credited to each trick's winner.
    pub fn penalty_totals(&self) -> [u8; 4] {
        let mut totals = [0u8; 4];
        for trick in &self.trick_history {
            let idx = trick.winner().index();
            totals[idx] = totals[idx].saturating_add(trick.points());
        }
        totals
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    TrickCompleted { winner: Seat, points: u8 },
}

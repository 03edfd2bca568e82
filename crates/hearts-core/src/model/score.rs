use crate::model::player::Seat;
use serde::{Deserialize, Serialize};

/// How a tie for the lowest score is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    LowestSeat,
    HighestSeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBoard {
    totals: [u32; 4],
}

impl ScoreBoard {
    pub const fn new() -> Self {
        Self { totals: [0; 4] }
    }

    pub fn add_points(&mut self, seat: Seat, points: u32) {
        self.totals[seat.index()] += points;
    }

    pub fn set_totals(&mut self, totals: [u32; 4]) {
        self.totals = totals;
    }

    pub fn score(&self, seat: Seat) -> u32 {
        self.totals[seat.index()]
    }

    pub fn standings(&self) -> &[u32; 4] {
        &self.totals
    }

    pub fn max_score(&self) -> u32 {
        self.totals.iter().copied().max().unwrap_or(0)
    }

    pub fn winner(&self, tie_break: TieBreak) -> Seat {
        let low = self.totals.iter().copied().min().unwrap_or(0);
        let mut tied = Seat::LOOP
            .iter()
            .copied()
            .filter(|seat| self.score(*seat) == low);
        let pick = match tie_break {
            TieBreak::LowestSeat => tied.next(),
            TieBreak::HighestSeat => tied.last(),
        };
        pick.unwrap_or(Seat::LOOP[0])
    }
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{ScoreBoard, TieBreak};
    use crate::model::player::Seat;

    #[test]
    fn scoreboard_tracks_points() {
        let mut board = ScoreBoard::new();
        board.add_points(Seat::LOOP[1], 13);
        board.add_points(Seat::LOOP[1], 2);
        assert_eq!(board.score(Seat::LOOP[1]), 15);
        assert_eq!(board.score(Seat::LOOP[0]), 0);
        assert_eq!(board.max_score(), 15);
    }

    #[test]
    fn winner_is_lowest_score() {
        let mut board = ScoreBoard::new();
        board.set_totals([26, 3, 40, 12]);
        assert_eq!(board.winner(TieBreak::LowestSeat), Seat::LOOP[1]);
        assert_eq!(board.winner(TieBreak::HighestSeat), Seat::LOOP[1]);
    }

    #[test]
    fn ties_follow_configured_rule() {
        let mut board = ScoreBoard::new();
        board.set_totals([10, 4, 30, 4]);
        assert_eq!(board.winner(TieBreak::LowestSeat), Seat::LOOP[1]);
        assert_eq!(board.winner(TieBreak::HighestSeat), Seat::LOOP[3]);
    }

    #[test]
    fn tie_break_uses_snake_case_names() {
        let parsed: TieBreak = serde_json::from_str("\"highest_seat\"").unwrap();
        assert_eq!(parsed, TieBreak::HighestSeat);
        assert_eq!(TieBreak::default(), TieBreak::LowestSeat);
    }
}

use core::fmt;
use serde::{Deserialize, Serialize};

/// Player index in fixed turn order; serialized as a bare integer `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Seat(u8);

impl Seat {
    pub const LOOP: [Seat; 4] = [Seat(0), Seat(1), Seat(2), Seat(3)];

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < 4 { Some(Seat(index as u8)) } else { None }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn next(self) -> Seat {
        Seat((self.0 + 1) % 4)
    }

    pub const fn previous(self) -> Seat {
        Seat((self.0 + 3) % 4)
    }

    /// Seat `offset` places after this one in turn order.
    pub const fn offset(self, offset: usize) -> Seat {
        Seat(((self.0 as usize + offset) % 4) as u8)
    }
}

impl TryFrom<u8> for Seat {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Seat::from_index(value as usize).ok_or_else(|| format!("player index {value} out of range 0..=3"))
    }
}

impl From<Seat> for u8 {
    fn from(seat: Seat) -> Self {
        seat.0
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "RankRepr", into = "RankRepr")]
#[repr(u8)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub const ORDERED: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            2 => Some(Rank::Two),
            3 => Some(Rank::Three),
            4 => Some(Rank::Four),
            5 => Some(Rank::Five),
            6 => Some(Rank::Six),
            7 => Some(Rank::Seven),
            8 => Some(Rank::Eight),
            9 => Some(Rank::Nine),
            10 => Some(Rank::Ten),
            11 => Some(Rank::Jack),
            12 => Some(Rank::Queen),
            13 => Some(Rank::King),
            14 => Some(Rank::Ace),
            _ => None,
        }
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    pub const fn is_face(self) -> bool {
        self.value() > 10
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        };
        f.write_str(text)
    }
}

/// Wire form: pip ranks are JSON numbers, court cards and aces are letters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RankRepr {
    Pip(u8),
    Face(String),
}

impl From<Rank> for RankRepr {
    fn from(rank: Rank) -> Self {
        if rank.is_face() {
            RankRepr::Face(rank.to_string())
        } else {
            RankRepr::Pip(rank.value())
        }
    }
}

impl TryFrom<RankRepr> for Rank {
    type Error = String;

    fn try_from(repr: RankRepr) -> Result<Self, Self::Error> {
        match repr {
            RankRepr::Pip(value @ 2..=10) => Rank::from_value(value)
                .ok_or_else(|| format!("rank {value} out of range")),
            RankRepr::Pip(value) => Err(format!(
                "rank {value} is not a pip rank; use 2-10 or J/Q/K/A"
            )),
            RankRepr::Face(text) => match text.as_str() {
                "J" => Ok(Rank::Jack),
                "Q" => Ok(Rank::Queen),
                "K" => Ok(Rank::King),
                "A" => Ok(Rank::Ace),
                other => Err(format!("unknown rank '{other}'")),
            },
        }
    }
}

use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Field order gives the natural sort: suit first, then rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub const TWO_OF_CLUBS: Card = Card::new(Rank::Two, Suit::Clubs);
    pub const QUEEN_OF_SPADES: Card = Card::new(Rank::Queen, Suit::Spades);

    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { suit, rank }
    }

    pub const fn is_penalty(self) -> bool {
        matches!(self.suit, Suit::Hearts) || self.is_queen_of_spades()
    }

    pub const fn is_queen_of_spades(self) -> bool {
        matches!(self.rank, Rank::Queen) && matches!(self.suit, Suit::Spades)
    }

    pub fn penalty_value(self) -> u8 {
        if self.is_queen_of_spades() {
            13
        } else if self.suit == Suit::Hearts {
            1
        } else {
            0
        }
    }

    /// Dense index in `0..52`: suit-major, rank-minor.
    pub const fn id(self) -> u8 {
        self.suit as u8 * 13 + (self.rank.value() - 2)
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        if id >= 52 {
            return None;
        }
        let suit = match Suit::from_index((id / 13) as usize) {
            Some(suit) => suit,
            None => return None,
        };
        match Rank::from_value(id % 13 + 2) {
            Some(rank) => Some(Card::new(rank, suit)),
            None => None,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

const CARD_FIELDS: &[&str] = &["suit", "rank"];

/// Only the object form is accepted; positional `[suit, rank]` pairs are rejected.
impl<'de> Deserialize<'de> for Card {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_struct("Card", CARD_FIELDS, CardVisitor)
    }
}

struct CardVisitor;

impl<'de> Visitor<'de> for CardVisitor {
    type Value = Card;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a card object with `suit` and `rank`")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Card, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut suit: Option<Suit> = None;
        let mut rank: Option<Rank> = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "suit" => {
                    if suit.is_some() {
                        return Err(de::Error::duplicate_field("suit"));
                    }
                    suit = Some(map.next_value()?);
                }
                "rank" => {
                    if rank.is_some() {
                        return Err(de::Error::duplicate_field("rank"));
                    }
                    rank = Some(map.next_value()?);
                }
                other => return Err(de::Error::unknown_field(other, CARD_FIELDS)),
            }
        }
        let suit = suit.ok_or_else(|| de::Error::missing_field("suit"))?;
        let rank = rank.ok_or_else(|| de::Error::missing_field("rank"))?;
        Ok(Card::new(rank, suit))
    }
}

#[cfg(test)]
mod tests {
    use super::{Card, Rank, Suit};

    #[test]
    fn queen_of_spades_identified() {
        let card = Card::new(Rank::Queen, Suit::Spades);
        assert!(card.is_queen_of_spades());
        assert!(card.is_penalty());
        assert_eq!(card.penalty_value(), 13);
    }

    #[test]
    fn regular_card_not_penalty() {
        let card = Card::new(Rank::Ten, Suit::Clubs);
        assert!(!card.is_penalty());
        assert_eq!(card.penalty_value(), 0);
    }

    #[test]
    fn hearts_are_one_point() {
        let card = Card::new(Rank::Ace, Suit::Hearts);
        assert!(card.is_penalty());
        assert_eq!(card.penalty_value(), 1);
    }

    #[test]
    fn ids_cover_the_deck_once() {
        let mut seen = [false; 52];
        for id in 0..52u8 {
            let card = Card::from_id(id).expect("id in range");
            assert_eq!(card.id(), id);
            seen[id as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(Card::from_id(52), None);
        assert_eq!(Card::TWO_OF_CLUBS.id(), 0);
    }

    #[test]
    fn json_shape_is_suit_and_rank() {
        let json = serde_json::to_string(&Card::QUEEN_OF_SPADES).unwrap();
        assert_eq!(json, r#"{"suit":"S","rank":"Q"}"#);
        let parsed: Card = serde_json::from_str(r#"{"suit":"H","rank":9}"#).unwrap();
        assert_eq!(parsed, Card::new(Rank::Nine, Suit::Hearts));
        assert!(serde_json::from_str::<Card>(r#"["H",9]"#).is_err());
        assert!(serde_json::from_str::<Card>(r#"{"suit":"H","rank":9,"id":3}"#).is_err());
    }
}

mod aggressive;
mod avoid;
mod random;
mod replay;
mod tactical;

pub use aggressive::AggressiveStrategy;
pub use avoid::AvoidPointsStrategy;
pub use random::RandomStrategy;
pub use replay::ReplayStrategy;
pub use tactical::TacticalStrategy;

use hearts_core::game::view::VisibleState;
use hearts_core::model::card::Card;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{Level, event};

/// Picks one card for the seat described by `view`.
///
/// The driver guarantees `legal` is non-empty and drawn from `view.hand`.
/// Returning a card outside `legal` aborts the game.
pub trait Strategy: Send {
    fn id(&self) -> &str;

    fn choose(&mut self, view: &VisibleState, legal: &[Card]) -> Card;
}

/// Strategies that can be built from configuration alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Random,
    Aggressive,
    AvoidPoints,
    Tactical,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Random,
        StrategyKind::Aggressive,
        StrategyKind::AvoidPoints,
        StrategyKind::Tactical,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Random => "random",
            StrategyKind::Aggressive => "aggressive",
            StrategyKind::AvoidPoints => "avoid_points",
            StrategyKind::Tactical => "tactical",
        }
    }

    /// `seed` only matters for strategies that draw randomness.
    pub fn spawn(self, seed: u64) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Random => Box::new(RandomStrategy::with_seed(seed)),
            StrategyKind::Aggressive => Box::new(AggressiveStrategy),
            StrategyKind::AvoidPoints => Box::new(AvoidPointsStrategy),
            StrategyKind::Tactical => Box::new(TacticalStrategy),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(StrategyKind::Random),
            "aggressive" => Ok(StrategyKind::Aggressive),
            "avoid_points" | "avoid" => Ok(StrategyKind::AvoidPoints),
            "tactical" | "my" => Ok(StrategyKind::Tactical),
            other => Err(format!("unknown strategy `{other}`")),
        }
    }
}

pub(crate) fn log_choice(view: &VisibleState, strategy: &str, legal: &[Card], chosen: Card, reason: &str) {
    if !tracing::enabled!(Level::TRACE) {
        return;
    }

    let legal_preview = if legal.len() <= 6 {
        legal
            .iter()
            .map(|card| card.to_string())
            .collect::<Vec<_>>()
            .join(",")
    } else {
        format!("{} moves", legal.len())
    };

    event!(
        target: "hearts_bot::strategy",
        Level::TRACE,
        game_id = view.game_id,
        seat = %view.seat,
        strategy,
        trick = view.trick_number(),
        legal_moves = %legal_preview,
        chosen = %chosen,
        reason,
    );
}


#[cfg(test)]
mod tests {
    use super::StrategyKind;

    #[test]
    fn kinds_parse_from_names() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>(), Ok(kind));
            assert_eq!(kind.spawn(1).id(), kind.as_str());
        }
        assert_eq!("my".parse::<StrategyKind>(), Ok(StrategyKind::Tactical));
        assert!("greedy".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn kinds_use_snake_case_in_config() {
        let kind: StrategyKind = serde_json::from_str("\"avoid_points\"").unwrap();
        assert_eq!(kind, StrategyKind::AvoidPoints);
    }
}

#![deny(warnings)]
pub mod game;
pub mod model;

pub use game::result::{GameResult, PlayerIdentity, PlayerRecord, RoundRecord};
pub use game::state::{Game, GameError, GamePhase, GameRules};
pub use game::view::{Decision, VisibleState};
pub use model::card::Card;
pub use model::player::Seat;
pub use model::rules::PlayError;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "hearts-sim"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "hearts-sim");
        assert!(!AppInfo::version().is_empty());
    }
}

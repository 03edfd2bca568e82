pub mod driver;
pub mod strategy;

pub use driver::{DecisionSummary, DriverError, GameDriver, GameRun, SeatConfig};
pub use strategy::{
    AggressiveStrategy, AvoidPointsStrategy, RandomStrategy, ReplayStrategy, Strategy,
    StrategyKind, TacticalStrategy,
};

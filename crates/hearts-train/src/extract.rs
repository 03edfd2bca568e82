use crate::error::ExtractError;
use crate::example::TrainingExample;
use crate::replay::replay_decisions;
use hearts_core::game::result::GameResult;
use hearts_core::game::view::Decision;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

pub const DEFAULT_MAX_ROUND_POINTS: u32 = 3;
pub const DEFAULT_MAX_TRICK_POINTS: u8 = 1;

/// Quality thresholds for keeping a move as a training example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPolicy {
    /// Moves by a seat that took more than this many points in the round are dropped.
    pub max_round_points: u32,
    /// Moves that won a trick worth more than this many points are dropped.
    pub max_trick_points: u8,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            max_round_points: DEFAULT_MAX_ROUND_POINTS,
            max_trick_points: DEFAULT_MAX_TRICK_POINTS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    policy: FilterPolicy,
}

impl Extractor {
    pub fn new(policy: FilterPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }

    /// Whether `decision` passes the filters, judged only from `result`.
    pub fn keep(&self, result: &GameResult, decision: &Decision) -> Result<bool, ExtractError> {
        let state = &decision.state;
        let round = result
            .rounds
            .iter()
            .find(|round| round.number == state.round_number)
            .ok_or(ExtractError::UnknownRound {
                game_id: result.game_id,
                round: state.round_number,
            })?;

        if round.points_for(state.seat) > self.policy.max_round_points {
            return Ok(false);
        }

        let trick_index = state.previous_tricks.len();
        let trick = round
            .tricks
            .get(trick_index)
            .ok_or(ExtractError::MissingTrick {
                game_id: result.game_id,
                round: state.round_number,
                trick: trick_index,
            })?;

        let won_costly_trick =
            trick.winner() == state.seat && trick.points() > self.policy.max_trick_points;
        Ok(!won_costly_trick)
    }

    /// Examples for every kept decision, in decision order.
    pub fn extract(
        &self,
        result: &GameResult,
        decisions: &[Decision],
    ) -> Result<Vec<TrainingExample>, ExtractError> {
        let mut examples = Vec::new();
        for decision in decisions {
            if self.keep(result, decision)? {
                examples.push(TrainingExample::from_decision(decision));
            }
        }

        event!(
            target: "hearts_train::extract",
            Level::DEBUG,
            game_id = result.game_id,
            decisions = decisions.len(),
            kept = examples.len(),
        );
        Ok(examples)
    }

    /// Same as [`Extractor::extract`], with decisions rebuilt from the archive.
    pub fn extract_archived(&self, result: &GameResult) -> Result<Vec<TrainingExample>, ExtractError> {
        let decisions = replay_decisions(result)?;
        self.extract(result, &decisions)
    }
}

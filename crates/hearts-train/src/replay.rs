use crate::error::ExtractError;
use hearts_core::game::result::{GameResult, RoundRecord};
use hearts_core::game::view::{Decision, VisibleState};
use hearts_core::model::hand::Hand;
use hearts_core::model::round::{PlayOutcome, RoundState};
use std::collections::HashSet;

/// Rebuilds every decision of an archived game from its initial hands and tricks.
///
/// Each archived move is re-checked against the rules, so a tampered or
/// truncated archive fails instead of yielding examples.
pub fn replay_decisions(result: &GameResult) -> Result<Vec<Decision>, ExtractError> {
    let game_id = result.game_id;
    let mut scores = [0u32; 4];
    let mut decisions = Vec::with_capacity(result.rounds.len() * 52);

    for record in &result.rounds {
        check_deal(game_id, record)?;
        let hands = record.initial_hands.clone().map(Hand::with_cards);
        let mut round = RoundState::from_hands(hands);

        for (trick_index, trick) in record.tricks.iter().enumerate() {
            trick.verify().map_err(|source| ExtractError::BadTrick {
                game_id,
                round: record.number,
                trick: trick_index,
                source,
            })?;

            for play in trick.plays() {
                let expected = round.current_player().ok_or(ExtractError::IncompleteRound {
                    game_id,
                    round: record.number,
                    tricks: record.tricks.len(),
                })?;
                if expected != play.position {
                    return Err(ExtractError::OutOfTurn {
                        game_id,
                        round: record.number,
                        trick: trick_index,
                        expected,
                        actual: play.position,
                    });
                }

                let state = VisibleState {
                    game_id,
                    round_number: record.number,
                    seat: play.position,
                    hand: round.hand(play.position).to_vec(),
                    previous_tricks: round.trick_history().to_vec(),
                    current_trick: round.current_trick().clone(),
                    scores,
                };

                let outcome = round.play_card(play.position, play.card).map_err(|source| {
                    ExtractError::IllegalMove {
                        game_id,
                        round: record.number,
                        trick: trick_index,
                        source,
                    }
                })?;
                if let PlayOutcome::TrickCompleted { winner, points } = outcome {
                    scores[winner.index()] += u32::from(points);
                }
                decisions.push(Decision {
                    state,
                    card: play.card,
                });
            }
        }

        if !round.is_complete() {
            return Err(ExtractError::IncompleteRound {
                game_id,
                round: record.number,
                tricks: record.tricks.len(),
            });
        }
    }

    Ok(decisions)
}

fn check_deal(game_id: u64, record: &RoundRecord) -> Result<(), ExtractError> {
    let mut seen = HashSet::with_capacity(52);
    let complete = record.initial_hands.iter().all(|hand| hand.len() == 13)
        && record
            .initial_hands
            .iter()
            .flatten()
            .all(|card| seen.insert(*card));
    if complete {
        Ok(())
    } else {
        Err(ExtractError::InvalidHands {
            game_id,
            round: record.number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::replay_decisions;
    use crate::error::ExtractError;
    use hearts_core::game::result::{GameResult, PlayerIdentity};
    use hearts_core::game::state::{Game, GameRules};

    fn first_legal_game(seed: u64) -> GameResult {
        let rules = GameRules {
            end_score: 0,
            ..GameRules::default()
        };
        let mut game = Game::new(seed, seed, rules);
        while let Some(card) = game.legal_moves().first().copied() {
            game.apply_move(card).unwrap();
        }
        game.advance_round().unwrap();
        game.into_result(std::array::from_fn(|i| PlayerIdentity {
            name: format!("p{i}"),
            strategy: "first".into(),
        }))
        .unwrap()
    }

    #[test]
    fn replays_every_move() {
        let result = first_legal_game(31);
        let decisions = replay_decisions(&result).unwrap();
        assert_eq!(decisions.len(), 52);
        assert_eq!(decisions[0].state.hand.len(), 13);
        assert!(decisions[0].state.previous_tricks.is_empty());
        assert_eq!(decisions[51].state.hand.len(), 1);
        assert_eq!(decisions[51].state.previous_tricks.len(), 12);
    }

    #[test]
    fn truncated_round_is_rejected() {
        let mut result = first_legal_game(32);
        result.rounds[0].tricks.pop();
        assert!(matches!(
            replay_decisions(&result),
            Err(ExtractError::IncompleteRound { .. })
        ));
    }

    #[test]
    fn duplicated_deal_is_rejected() {
        let mut result = first_legal_game(33);
        let card = result.rounds[0].initial_hands[0][0];
        result.rounds[0].initial_hands[1][0] = card;
        assert!(matches!(
            replay_decisions(&result),
            Err(ExtractError::InvalidHands { .. })
        ));
    }
}

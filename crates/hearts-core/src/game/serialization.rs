use super::result::GameResult;

impl GameResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Single-line form used by the game archive.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use crate::game::result::{GameResult, PlayerIdentity};
    use crate::game::state::{Game, GameRules};
    use crate::model::score::TieBreak;

    fn finished_game() -> GameResult {
        let rules = GameRules {
            end_score: 0,
            tie_break: TieBreak::LowestSeat,
        };
        let mut game = Game::new(12, 99, rules);
        while let Some(card) = game.legal_moves().first().copied() {
            game.apply_move(card).unwrap();
        }
        game.advance_round().unwrap();
        game.into_result(std::array::from_fn(|i| PlayerIdentity {
            name: format!("Player {i}"),
            strategy: "first".into(),
        }))
        .unwrap()
    }

    #[test]
    fn result_serializes_to_json() {
        let json = finished_game().to_json().unwrap();
        assert!(json.contains("\"game_id\": 12"));
        assert!(json.contains("\"seed\": 99"));
        assert!(json.contains("\"initial_hands\""));
        assert!(json.contains("\"first_player_index\""));
    }

    #[test]
    fn json_line_roundtrip_preserves_result() {
        let result = finished_game();
        let line = result.to_json_line().unwrap();
        assert!(!line.contains('\n'));
        let restored = GameResult::from_json(&line).unwrap();
        assert_eq!(restored, result);
        for round in &restored.rounds {
            for trick in &round.tricks {
                assert!(trick.verify().is_ok());
            }
        }
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(GameResult::from_json("{\"game_id\": 1}").is_err());
    }
}

use hearts_bot::strategy::Strategy;
use hearts_core::game::view::VisibleState;
use hearts_core::model::card::Card;
use tracing::{Level, event};

use crate::handler::PredictionHandler;
use crate::protocol::PredictRequest;

/// Plays a seat by sending every decision through a [`PredictionHandler`],
/// so simulated games exercise the same path as served requests.
pub struct ModelStrategy {
    id: String,
    handler: PredictionHandler,
}

impl ModelStrategy {
    pub fn new(handler: PredictionHandler) -> Self {
        Self {
            id: format!("model:{}", handler.model_name()),
            handler,
        }
    }
}

impl Strategy for ModelStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn choose(&mut self, view: &VisibleState, legal: &[Card]) -> Card {
        let request = PredictRequest::from_view(view, legal);
        match self.handler.handle(&request) {
            Ok(response) => response.card,
            Err(err) => {
                event!(
                    target: "hearts_predict::strategy",
                    Level::ERROR,
                    game_id = view.game_id,
                    seat = %view.seat,
                    error = %err,
                    "game position rejected by the handler"
                );
                legal[0]
            }
        }
    }
}

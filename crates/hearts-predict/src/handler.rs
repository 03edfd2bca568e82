use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use hearts_core::model::card::Card;
use thiserror::Error;
use tracing::{Level, event};

use crate::model::{CardModel, ModelError};
use crate::protocol::{ErrorResponse, PredictRequest, PredictResponse};
use crate::validate::{RequestError, validate_request};

pub const DEFAULT_TIMEOUT_MS: u64 = 1_200;

/// How long past the deadline the handler waits for a model to clean up.
const RELEASE_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error("model did not answer within {0:?}")]
    RequestTimeout(Duration),
    #[error("model {model} failed: {source}")]
    Model {
        model: String,
        #[source]
        source: ModelError,
    },
}

impl PredictError {
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::InvalidRequest(_) => "invalid_request",
            PredictError::RequestTimeout(_) => "request_timeout",
            PredictError::Model { .. } => "model_error",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.kind(), self.to_string())
    }
}

/// Validates requests and asks the model for a card, never returning a card
/// outside the request's valid moves.
///
/// Holds no per-request state; one handler can serve many threads.
#[derive(Clone)]
pub struct PredictionHandler {
    model: Arc<dyn CardModel>,
    timeout: Duration,
}

impl PredictionHandler {
    pub fn new(model: Arc<dyn CardModel>) -> Self {
        Self {
            model,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Answers a request. Only malformed requests are errors; timeouts, model
    /// failures and off-list answers fall back to the first valid move.
    pub fn handle(&self, request: &PredictRequest) -> Result<PredictResponse, PredictError> {
        validate_request(request)?;
        // validate_request rejects an empty move list
        let fallback = request.valid_moves[0];

        let reason = match self.dispatch(request) {
            Ok(card) if request.valid_moves.contains(&card) => {
                return Ok(PredictResponse::answered(card));
            }
            Ok(card) => format!("model answered {card}, which is not a valid move"),
            Err(err) => err.to_string(),
        };

        event!(
            target: "hearts_predict::handler",
            Level::WARN,
            model = %self.model.name(),
            game_id = request.state.game_id,
            fallback = %fallback,
            reason = %reason,
            "prediction degraded; falling back"
        );
        Ok(PredictResponse::fallback(fallback, reason))
    }

    /// Runs the model on a worker thread with the configured deadline. The
    /// model is expected to give up by then; a model that does not is
    /// abandoned shortly after and its late answer is dropped.
    pub fn dispatch(&self, request: &PredictRequest) -> Result<Card, PredictError> {
        let (tx, rx) = mpsc::channel();
        let model = Arc::clone(&self.model);
        let owned = request.clone();
        let timeout = self.timeout;
        let start = Instant::now();
        thread::spawn(move || {
            let _ = tx.send(model.predict(&owned, timeout));
        });

        let outcome = match rx.recv_timeout(self.timeout + RELEASE_GRACE) {
            Ok(Ok(card)) => Ok(card),
            Ok(Err(ModelError::Timeout(_))) => Err(PredictError::RequestTimeout(self.timeout)),
            Ok(Err(source)) => Err(PredictError::Model {
                model: self.model.name().to_string(),
                source,
            }),
            Err(RecvTimeoutError::Timeout) => Err(PredictError::RequestTimeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(PredictError::Model {
                model: self.model.name().to_string(),
                source: ModelError::Disconnected,
            }),
        };

        if tracing::enabled!(Level::DEBUG) {
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            event!(
                target: "hearts_predict::handler",
                Level::DEBUG,
                model = %self.model.name(),
                game_id = request.state.game_id,
                elapsed_ms,
                ok = outcome.is_ok(),
            );
        }
        outcome
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::fixtures::{FixedModel, follow_request};
    use super::{PredictError, PredictionHandler};
    use crate::model::{CardModel, ModelError};
    use crate::protocol::PredictRequest;
    use hearts_core::model::card::Card;
    use hearts_core::model::rank::Rank;
    use hearts_core::model::suit::Suit;

    struct FailingModel;

    impl CardModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict(&self, _request: &PredictRequest, _timeout: Duration) -> Result<Card, ModelError> {
            Err(ModelError::Status("exit status 3".into()))
        }
    }

    #[test]
    fn valid_answer_passes_through() {
        let model = Arc::new(FixedModel::new(Card::new(Rank::King, Suit::Clubs)));
        let handler = PredictionHandler::new(model.clone());
        let response = handler.handle(&follow_request()).unwrap();
        assert_eq!(response.card, Card::new(Rank::King, Suit::Clubs));
        assert!(!response.degraded);
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn off_list_answer_is_replaced_by_first_valid_move() {
        let model = Arc::new(FixedModel::new(Card::new(Rank::Ace, Suit::Spades)));
        let handler = PredictionHandler::new(model);
        let response = handler.handle(&follow_request()).unwrap();
        assert_eq!(response.card, Card::new(Rank::Three, Suit::Clubs));
        assert!(response.degraded);
        assert!(response.reason.unwrap().contains("not a valid move"));
    }

    #[test]
    fn invalid_request_never_reaches_model() {
        let model = Arc::new(FixedModel::new(Card::new(Rank::King, Suit::Clubs)));
        let handler = PredictionHandler::new(model.clone());
        let mut request = follow_request();
        request.valid_moves.push(Card::new(Rank::Four, Suit::Diamonds));
        let err = handler.handle(&request).unwrap_err();
        assert!(matches!(err, PredictError::InvalidRequest(_)));
        assert_eq!(err.kind(), "invalid_request");
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn slow_model_times_out() {
        let mut slow = FixedModel::new(Card::new(Rank::King, Suit::Clubs));
        slow.delay = Duration::from_millis(500);
        let handler =
            PredictionHandler::new(Arc::new(slow)).with_timeout(Duration::from_millis(20));
        let request = follow_request();

        let err = handler.dispatch(&request).unwrap_err();
        assert!(matches!(err, PredictError::RequestTimeout(_)));
        assert_eq!(err.to_response().error.kind, "request_timeout");

        let response = handler.handle(&request).unwrap();
        assert_eq!(response.card, Card::new(Rank::Three, Suit::Clubs));
        assert!(response.degraded);
    }

    #[test]
    fn model_failure_degrades() {
        let handler = PredictionHandler::new(Arc::new(FailingModel));
        let request = follow_request();
        assert!(matches!(
            handler.dispatch(&request),
            Err(PredictError::Model { .. })
        ));
        let response = handler.handle(&request).unwrap();
        assert!(response.degraded);
        assert!(response.reason.unwrap().contains("exit status 3"));
    }

    #[cfg(unix)]
    #[test]
    fn timed_out_process_leaves_no_child() {
        use crate::model::ProcessModel;

        let dir = tempfile::tempdir().unwrap();
        let mut scripts = Vec::new();
        for index in 0..3 {
            let pid_file = dir.path().join(format!("model{index}.pid"));
            let script = format!("echo $$ > {}; read line; exec sleep 30", pid_file.display());
            let handler = PredictionHandler::new(Arc::new(ProcessModel::new(
                "sh",
                vec!["-c".into(), script],
            )))
            .with_timeout(Duration::from_millis(300));

            let err = handler.dispatch(&follow_request()).unwrap_err();
            assert!(matches!(err, PredictError::RequestTimeout(_)));
            scripts.push(pid_file);
        }

        for pid_file in scripts {
            let pid = std::fs::read_to_string(&pid_file).unwrap();
            let alive = std::process::Command::new("kill")
                .args(["-0", pid.trim()])
                .stderr(std::process::Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false);
            assert!(!alive, "model process {} outlived its request", pid.trim());
        }
    }
}

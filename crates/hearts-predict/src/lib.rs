pub mod handler;
pub mod model;
pub mod protocol;
pub mod server;
pub mod strategy;
pub mod validate;

pub use handler::{DEFAULT_TIMEOUT_MS, PredictError, PredictionHandler};
pub use model::{CardModel, ModelError, ProcessModel, StrategyModel};
pub use protocol::{ErrorDetail, ErrorResponse, PLACEHOLDER_ROUND, PROTOCOL_VERSION, PredictRequest, PredictResponse, PredictState};
pub use server::{ServeSummary, serve};
pub use strategy::ModelStrategy;
pub use validate::{RequestError, validate_request};

pub mod breaker;
pub mod heuristic;
pub mod llm;
pub mod inference;

pub use breaker::{CircuitBreaker, CircuitState};
pub use heuristic::simple_infer;
pub use inference::{sanitize, SearchInferrer};
pub use llm::{FilterModel, OpenAiClient};

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Model service error: {0}")]
    Service(String),

    #[error("Empty model response")]
    EmptyResponse,

    #[error("Circuit open for {0}")]
    CircuitOpen(String),
}

pub type InferenceResult<T> = Result<T, InferenceError>;

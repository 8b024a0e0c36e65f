use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Degenerate volatility in {context}: portfolio volatility is zero")]
    DegenerateVolatility { context: String },

    #[error("Optimization cancelled after {iterations} iterations")]
    Cancelled { iterations: usize },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for OptimizerError {
    fn from(e: serde_json::Error) -> Self {
        OptimizerError::SerializationError(e.to_string())
    }
}

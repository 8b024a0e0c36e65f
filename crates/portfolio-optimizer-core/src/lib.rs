pub mod error;
pub mod instrumentation;
pub mod types;

#[cfg(feature = "portfolio_optimization")]
pub mod portfolio_optimization;

pub use error::OptimizerError;
pub use types::*;

/// Standard result type for all optimizer operations
pub type OptimizerResult<T> = Result<T, OptimizerError>;

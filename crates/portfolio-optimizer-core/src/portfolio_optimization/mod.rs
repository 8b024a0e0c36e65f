//! Sharpe-ratio maximisation over long-only weight vectors.
//!
//! The search is a projected gradient descent on the negated Sharpe ratio
//! with a decaying step size. It is sometimes marketed as
//! "quantum-inspired"; there is nothing quantum in the computation.

pub mod covariance;
pub mod metrics;
pub mod objective;
pub mod optimizer;

#[cfg(feature = "allocation")]
pub mod allocation;

pub use covariance::{
    build_covariance, estimate_covariance, CovarianceInput, CovarianceMatrix, CONSTANT_CORRELATION,
};
pub use metrics::{calculate_metrics, portfolio_metrics, MetricsInput};
pub use objective::{gradient, objective};
pub use optimizer::{
    optimize, optimize_portfolio, OptimizationInput, OptimizerConfig, SharpeOptimizer,
};

use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;

use portfolio_optimizer_core::instrumentation::TracingTimingHook;
use portfolio_optimizer_core::portfolio_optimization::allocation::{self, AllocationInput};
use portfolio_optimizer_core::portfolio_optimization::{
    covariance, metrics, CovarianceInput, MetricsInput, OptimizationInput, SharpeOptimizer,
};

use crate::input;

#[derive(Args)]
pub struct OptimizeArgs {
    /// Path to JSON file with `assets`, optional `constraints` and tuning fields
    #[arg(long)]
    pub input: Option<String>,

    /// Risk-free rate (overrides the input file)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Maximum gradient iterations (overrides the input file)
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Convergence tolerance on the objective (overrides the input file)
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Log the wall-clock time of the optimization to stderr
    #[arg(long)]
    pub timing: bool,
}

#[derive(Args)]
pub struct MetricsArgs {
    /// Path to JSON file with `assets`, `weights` and optional `risk_free_rate`
    #[arg(long)]
    pub input: Option<String>,

    /// Risk-free rate (overrides the input file)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,
}

#[derive(Args)]
pub struct CovarianceArgs {
    /// Path to JSON file with `assets`
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON file with `assets`, `weights` and optional `portfolio_value`
    #[arg(long)]
    pub input: Option<String>,

    /// Total capital to allocate (overrides the input file)
    #[arg(long)]
    pub portfolio_value: Option<Decimal>,
}

pub fn run_optimize(args: OptimizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut opt_input: OptimizationInput =
        input::load(args.input.as_deref(), "portfolio optimization")?;
    if let Some(rf) = args.risk_free_rate {
        opt_input.config.risk_free_rate = rf;
    }
    if let Some(max_iterations) = args.max_iterations {
        opt_input.config.max_iterations = max_iterations;
    }
    if let Some(tolerance) = args.tolerance {
        opt_input.config.tolerance = tolerance;
    }

    let mut engine = SharpeOptimizer::new(opt_input.config.clone());
    if args.timing {
        engine = engine.with_timing_hook(Arc::new(TracingTimingHook));
    }
    let result = engine.optimize_with_metadata(&opt_input.assets, &opt_input.constraints)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut m_input: MetricsInput = input::load(args.input.as_deref(), "portfolio metrics")?;
    if let Some(rf) = args.risk_free_rate {
        m_input.risk_free_rate = rf;
    }
    let result = metrics::portfolio_metrics(&m_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_covariance(args: CovarianceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cov_input: CovarianceInput = input::load(args.input.as_deref(), "covariance estimation")?;
    let result = covariance::estimate_covariance(&cov_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut alloc_input: AllocationInput =
        input::load(args.input.as_deref(), "allocation report")?;
    if let Some(value) = args.portfolio_value {
        alloc_input.portfolio_value = Some(value);
    }
    let result = allocation::build_allocation_report(&alloc_input)?;
    Ok(serde_json::to_value(result)?)
}

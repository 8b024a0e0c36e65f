use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

use super::covariance::build_covariance;
use super::metrics::metrics_with_covariance;
use super::objective::{gradient, objective};
use crate::error::OptimizerError;
use crate::instrumentation::{timed, TimingHook};
use crate::types::{
    with_metadata, Asset, ComputationOutput, Constraints, OptimizationResult, Rate,
    WEIGHT_TOLERANCE,
};
use crate::OptimizerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Tuning knobs for the gradient search. Every field may be omitted in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Annual risk-free rate used in the Sharpe ratio (default 0.02).
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: Rate,
    /// Upper bound on loop passes (default 100).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Stop when the objective moves by less than this (default 1e-6).
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,
    /// Step size at iteration 0 (default 0.01).
    #[serde(default = "default_initial_learning_rate")]
    pub initial_learning_rate: Decimal,
    /// Iterations per e-fold of step-size decay (default 50).
    #[serde(default = "default_learning_rate_decay")]
    pub learning_rate_decay: Decimal,
}

fn default_risk_free_rate() -> Rate {
    dec!(0.02)
}

fn default_max_iterations() -> usize {
    100
}

fn default_tolerance() -> Decimal {
    dec!(0.000001)
}

fn default_initial_learning_rate() -> Decimal {
    dec!(0.01)
}

fn default_learning_rate_decay() -> Decimal {
    dec!(50)
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            initial_learning_rate: default_initial_learning_rate(),
            learning_rate_decay: default_learning_rate_decay(),
        }
    }
}

/// Input to a full optimization run, as read by the CLI and bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationInput {
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(flatten)]
    pub config: OptimizerConfig,
}

/// Result of the raw search plus whether the tolerance test fired.
struct SearchOutcome {
    result: OptimizationResult,
    converged: bool,
}

/// Constrained gradient-descent maximiser of the Sharpe ratio.
///
/// Starts from equal weights and, each iteration, steps against the gradient
/// of the negated Sharpe ratio, clamps every weight into the constraint band
/// and rescales so the weights sum to one. There is no randomness: identical
/// inputs always produce identical results.
#[derive(Clone, Default)]
pub struct SharpeOptimizer {
    config: OptimizerConfig,
    timing_hook: Option<Arc<dyn TimingHook>>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for SharpeOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharpeOptimizer")
            .field("config", &self.config)
            .field("timing_hook", &self.timing_hook.is_some())
            .field("cancel_flag", &self.cancel_flag.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl SharpeOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            timing_hook: None,
            cancel_flag: None,
        }
    }

    /// Default configuration with the given risk-free rate.
    pub fn with_risk_free_rate(risk_free_rate: Rate) -> Self {
        Self::new(OptimizerConfig {
            risk_free_rate,
            ..OptimizerConfig::default()
        })
    }

    /// Report the duration of every `optimize` call to `hook`.
    pub fn with_timing_hook(mut self, hook: Arc<dyn TimingHook>) -> Self {
        self.timing_hook = Some(hook);
        self
    }

    /// Abort with [`OptimizerError::Cancelled`] once `flag` is set.
    ///
    /// The flag is polled before each iteration, never mid-gradient.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Run the search and return the final weights with their metrics.
    pub fn optimize(
        &self,
        assets: &[Asset],
        constraints: &Constraints,
    ) -> OptimizerResult<OptimizationResult> {
        self.search(assets, constraints).map(|o| o.result)
    }

    /// [`SharpeOptimizer::optimize`] wrapped in the standard output envelope,
    /// with convergence and constraint warnings. The timing hook and cancel
    /// flag apply as for `optimize`.
    pub fn optimize_with_metadata(
        &self,
        assets: &[Asset],
        constraints: &Constraints,
    ) -> OptimizerResult<ComputationOutput<OptimizationResult>> {
        let start = Instant::now();
        let outcome = self.search(assets, constraints)?;
        let warnings = collect_warnings(assets, constraints, &self.config, &outcome);

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Constrained gradient descent on negative Sharpe ratio (constant-correlation covariance)",
            &serde_json::json!({
                "n_assets": assets.len(),
                "risk_free_rate": self.config.risk_free_rate.to_string(),
                "min_weight": constraints.min_weight.to_string(),
                "max_weight": constraints.max_weight.to_string(),
                "max_iterations": self.config.max_iterations,
                "tolerance": self.config.tolerance.to_string(),
                "converged": outcome.converged,
            }),
            warnings,
            elapsed,
            outcome.result,
        ))
    }

    fn search(
        &self,
        assets: &[Asset],
        constraints: &Constraints,
    ) -> OptimizerResult<SearchOutcome> {
        timed(self.timing_hook.as_deref(), "optimize", || {
            self.run(assets, constraints)
        })
    }

    fn run(&self, assets: &[Asset], constraints: &Constraints) -> OptimizerResult<SearchOutcome> {
        validate_input(assets, constraints, &self.config)?;

        let n = assets.len();
        let rf = self.config.risk_free_rate;
        let mu: Vec<Decimal> = assets.iter().map(|a| a.expected_return).collect();
        let cov = build_covariance(assets);

        debug!(
            n_assets = n,
            max_iterations = self.config.max_iterations,
            min_weight = %constraints.min_weight,
            max_weight = %constraints.max_weight,
            "starting Sharpe optimization"
        );

        let mut w = equal_weights(n);
        let mut convergence_data: Vec<Decimal> = Vec::with_capacity(self.config.max_iterations);
        let mut converged = false;

        for iteration in 0..self.config.max_iterations {
            if self.is_cancelled() {
                warn!(iteration, "optimization cancelled");
                return Err(OptimizerError::Cancelled {
                    iterations: convergence_data.len(),
                });
            }

            let current = objective(&w, &mu, &cov, rf)?;
            convergence_data.push(-current);

            let lr = self.learning_rate(iteration);
            let grad = gradient(&w, &mu, &cov, rf)?;

            let mut candidate: Vec<Decimal> = w
                .iter()
                .zip(grad.iter())
                .map(|(wi, gi)| constraints.clamp(*wi - lr * *gi))
                .collect();
            // Single pass: no second clamp after rescaling.
            normalize_weights(&mut candidate);
            w = candidate;

            let next = objective(&w, &mu, &cov, rf)?;
            trace!(
                iteration = iteration + 1,
                sharpe = %(-current),
                learning_rate = %lr,
                "optimizer step"
            );

            if (next - current).abs() < self.config.tolerance {
                converged = true;
                break;
            }
        }

        let metrics = metrics_with_covariance(&w, &mu, &cov, rf)?;
        let iterations = convergence_data.len();

        debug!(
            iterations,
            converged,
            sharpe_ratio = %metrics.sharpe_ratio,
            "finished Sharpe optimization"
        );

        Ok(SearchOutcome {
            result: OptimizationResult {
                optimal_weights: w,
                expected_return: metrics.expected_return,
                volatility: metrics.volatility,
                sharpe_ratio: metrics.sharpe_ratio,
                convergence_data,
                iterations,
            },
            converged,
        })
    }

    /// initial * e^(-iteration / decay)
    fn learning_rate(&self, iteration: usize) -> Decimal {
        let exponent = -Decimal::from(iteration as u64) / self.config.learning_rate_decay;
        // exp underflow only happens far down the schedule; the step is ~0 there
        let decay = exponent.checked_exp().unwrap_or(Decimal::ZERO);
        self.config.initial_learning_rate * decay
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Maximise the Sharpe ratio of `assets` under `constraints`.
pub fn optimize(
    assets: &[Asset],
    constraints: &Constraints,
    config: &OptimizerConfig,
) -> OptimizerResult<OptimizationResult> {
    SharpeOptimizer::new(config.clone()).optimize(assets, constraints)
}

/// Run the optimizer and wrap the result in the standard output envelope.
pub fn optimize_portfolio(
    input: &OptimizationInput,
) -> OptimizerResult<ComputationOutput<OptimizationResult>> {
    SharpeOptimizer::new(input.config.clone())
        .optimize_with_metadata(&input.assets, &input.constraints)
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

fn collect_warnings(
    assets: &[Asset],
    constraints: &Constraints,
    config: &OptimizerConfig,
    outcome: &SearchOutcome,
) -> Vec<String> {
    let mut warnings = Vec::new();
    let n = Decimal::from(assets.len() as u64);

    if !outcome.converged {
        warnings.push(format!(
            "Did not converge within {} iterations (tolerance {})",
            config.max_iterations, config.tolerance
        ));
    }

    if constraints.min_weight * n > Decimal::ONE || constraints.max_weight * n < Decimal::ONE {
        warnings.push(format!(
            "Weight band [{}, {}] cannot sum to 1 across {} assets",
            constraints.min_weight,
            constraints.max_weight,
            assets.len()
        ));
    }

    for (asset, w) in assets.iter().zip(outcome.result.optimal_weights.iter()) {
        if !constraints.contains(*w, WEIGHT_TOLERANCE) {
            warnings.push(format!(
                "{} weight {:.6} left the band [{}, {}] after renormalisation",
                asset.symbol, w, constraints.min_weight, constraints.max_weight
            ));
        }
    }

    if outcome.result.sharpe_ratio < Decimal::ZERO {
        warnings.push(format!(
            "Negative Sharpe ratio {:.4}: risk-free rate {} exceeds achievable return",
            outcome.result.sharpe_ratio, config.risk_free_rate
        ));
    }

    warnings
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(
    assets: &[Asset],
    constraints: &Constraints,
    config: &OptimizerConfig,
) -> OptimizerResult<()> {
    if assets.len() < 2 {
        return Err(OptimizerError::InvalidInput {
            field: "assets".into(),
            reason: format!("At least 2 assets required, got {}", assets.len()),
        });
    }

    if constraints.min_weight < Decimal::ZERO || constraints.max_weight > Decimal::ONE {
        return Err(OptimizerError::InvalidInput {
            field: "constraints".into(),
            reason: format!(
                "Weight bounds must lie in [0, 1], got [{}, {}]",
                constraints.min_weight, constraints.max_weight
            ),
        });
    }

    if constraints.min_weight > constraints.max_weight {
        return Err(OptimizerError::InvalidInput {
            field: "constraints".into(),
            reason: "min_weight > max_weight".into(),
        });
    }

    if config.max_iterations == 0 {
        return Err(OptimizerError::InvalidInput {
            field: "max_iterations".into(),
            reason: "Must be at least 1".into(),
        });
    }

    if config.tolerance < Decimal::ZERO {
        return Err(OptimizerError::InvalidInput {
            field: "tolerance".into(),
            reason: "Must be non-negative".into(),
        });
    }

    if config.initial_learning_rate < Decimal::ZERO {
        return Err(OptimizerError::InvalidInput {
            field: "initial_learning_rate".into(),
            reason: "Must be non-negative".into(),
        });
    }

    if config.learning_rate_decay <= Decimal::ZERO {
        return Err(OptimizerError::InvalidInput {
            field: "learning_rate_decay".into(),
            reason: "Must be positive".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Weight helpers
// ---------------------------------------------------------------------------

/// Normalize weights to sum to 1.
fn normalize_weights(w: &mut [Decimal]) {
    let total: Decimal = w.iter().sum();
    if !total.is_zero() {
        for wi in w.iter_mut() {
            *wi /= total;
        }
    }
}

/// Equal weights for n assets.
fn equal_weights(n: usize) -> Vec<Decimal> {
    let w = Decimal::ONE / Decimal::from(n as u64);
    vec![w; n]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

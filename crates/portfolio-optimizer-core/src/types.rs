use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Rates expressed as decimals (0.12 = 12%). Never as percentages.
pub type Rate = Decimal;

/// Monetary amounts (prices, portfolio values).
pub type Money = Decimal;

/// A single investable asset as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique ticker-style identifier.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Annualised expected return.
    pub expected_return: Rate,
    /// Annualised volatility (standard deviation), non-negative.
    pub volatility: Rate,
    /// Unit price. Only used for allocation reporting.
    pub price: Money,
}

/// Box constraint applied identically to every asset weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub min_weight: Rate,
    #[serde(default = "default_max_weight")]
    pub max_weight: Rate,
}

fn default_max_weight() -> Rate {
    Decimal::ONE
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            min_weight: Decimal::ZERO,
            max_weight: Decimal::ONE,
        }
    }
}

impl Constraints {
    pub fn new(min_weight: Rate, max_weight: Rate) -> Self {
        Self {
            min_weight,
            max_weight,
        }
    }

    /// Clamp a single weight into `[min_weight, max_weight]`.
    pub fn clamp(&self, weight: Rate) -> Rate {
        if weight < self.min_weight {
            self.min_weight
        } else if weight > self.max_weight {
            self.max_weight
        } else {
            weight
        }
    }

    /// Whether `weight` lies inside the band, allowing `tolerance` slack.
    pub fn contains(&self, weight: Rate, tolerance: Decimal) -> bool {
        weight >= self.min_weight - tolerance && weight <= self.max_weight + tolerance
    }
}

/// Expected return, volatility and Sharpe ratio of a weighted portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub expected_return: Rate,
    pub volatility: Rate,
    pub sharpe_ratio: Decimal,
}

/// Outcome of a single optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Weights aligned positionally with the input asset list.
    pub optimal_weights: Vec<Rate>,
    pub expected_return: Rate,
    pub volatility: Rate,
    pub sharpe_ratio: Decimal,
    /// Sharpe ratio at the start of every completed iteration, in order.
    pub convergence_data: Vec<Decimal>,
    /// Number of completed iterations (always `convergence_data.len()`).
    pub iterations: usize,
}

impl OptimizationResult {
    pub fn metrics(&self) -> PortfolioMetrics {
        PortfolioMetrics {
            expected_return: self.expected_return,
            volatility: self.volatility,
            sharpe_ratio: self.sharpe_ratio,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Tolerance used when checking sum-to-one and band membership.
pub const WEIGHT_TOLERANCE: Decimal = dec!(0.000001);

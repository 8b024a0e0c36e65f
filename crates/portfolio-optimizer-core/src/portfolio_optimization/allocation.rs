use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::covariance::build_covariance;
use super::metrics::metrics_with_covariance;
use crate::error::OptimizerError;
use crate::types::{
    with_metadata, Asset, ComputationOutput, Money, PortfolioMetrics, Rate, WEIGHT_TOLERANCE,
};
use crate::OptimizerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for an allocation report on a fixed weight vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    pub assets: Vec<Asset>,
    /// Weights aligned with `assets`.
    pub weights: Vec<Rate>,
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: Rate,
    /// Total capital to split across the assets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_value: Option<Money>,
}

fn default_risk_free_rate() -> Rate {
    dec!(0.02)
}

/// Per-asset line of an allocation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub symbol: String,
    pub name: String,
    pub weight: Rate,
    /// Weight times expected return.
    pub contribution_to_return: Rate,
    /// Weight times marginal contribution to portfolio volatility.
    pub contribution_to_risk: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocated_value: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Decimal>,
}

/// Allocation breakdown with portfolio-level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub allocations: Vec<AssetAllocation>,
    pub expected_return: Rate,
    pub volatility: Rate,
    pub sharpe_ratio: Decimal,
    /// Weighted average asset volatility over portfolio volatility.
    pub diversification_ratio: Decimal,
    /// Herfindahl-Hirschman index of weights.
    pub hhi_concentration: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Break a weight vector down into per-asset contributions and, when a
/// portfolio value is supplied, money amounts and unit counts at each
/// asset's price.
pub fn build_allocation_report(
    input: &AllocationInput,
) -> OptimizerResult<ComputationOutput<AllocationReport>> {
    let start = Instant::now();
    let assets = &input.assets;
    let weights = &input.weights;
    let n = assets.len();

    if weights.len() != n {
        return Err(OptimizerError::InvalidInput {
            field: "weights".into(),
            reason: format!("Expected {} weights (one per asset) but got {}", n, weights.len()),
        });
    }
    if let Some(value) = input.portfolio_value {
        if value < Decimal::ZERO {
            return Err(OptimizerError::InvalidInput {
                field: "portfolio_value".into(),
                reason: "Must be non-negative".into(),
            });
        }
        if let Some(a) = assets.iter().find(|a| a.price <= Decimal::ZERO) {
            return Err(OptimizerError::InvalidInput {
                field: "price".into(),
                reason: format!("{} has non-positive price {}", a.symbol, a.price),
            });
        }
    }

    let cov = build_covariance(assets);
    let mu: Vec<Decimal> = assets.iter().map(|a| a.expected_return).collect();
    let PortfolioMetrics {
        expected_return,
        volatility,
        sharpe_ratio,
    } = metrics_with_covariance(weights, &mu, &cov, input.risk_free_rate)?;

    let sigma_w = cov.mul_vec(weights);
    let allocations: Vec<AssetAllocation> = assets
        .iter()
        .zip(weights.iter())
        .zip(sigma_w.iter())
        .map(|((asset, w), sw)| {
            let allocated_value = input.portfolio_value.map(|v| *w * v);
            AssetAllocation {
                symbol: asset.symbol.clone(),
                name: asset.name.clone(),
                weight: *w,
                contribution_to_return: *w * asset.expected_return,
                contribution_to_risk: *w * *sw / volatility,
                allocated_value,
                units: allocated_value.map(|v| v / asset.price),
            }
        })
        .collect();

    let weighted_avg_vol: Decimal = assets
        .iter()
        .zip(weights.iter())
        .map(|(a, w)| *w * a.volatility)
        .sum();
    let diversification_ratio = weighted_avg_vol / volatility;
    let hhi_concentration: Decimal = weights.iter().map(|w| *w * *w).sum();

    let warnings = collect_warnings(&allocations, volatility, hhi_concentration);

    let report = AllocationReport {
        allocations,
        expected_return,
        volatility,
        sharpe_ratio,
        diversification_ratio,
        hhi_concentration,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Weight allocation with return/risk contributions",
        &serde_json::json!({
            "n_assets": n,
            "risk_free_rate": input.risk_free_rate.to_string(),
            "portfolio_value": input.portfolio_value.map(|v| v.to_string()),
        }),
        warnings,
        elapsed,
        report,
    ))
}

fn collect_warnings(
    allocations: &[AssetAllocation],
    volatility: Rate,
    hhi: Decimal,
) -> Vec<String> {
    let mut warnings = Vec::new();

    let total: Decimal = allocations.iter().map(|a| a.weight).sum();
    if (total - Decimal::ONE).abs() > WEIGHT_TOLERANCE {
        warnings.push(format!("Weights sum to {:.6}, not 1", total));
    }

    for a in allocations {
        if a.weight < Decimal::ZERO || a.weight > Decimal::ONE {
            warnings.push(format!("{} weight {:.4} outside [0, 1]", a.symbol, a.weight));
        } else if a.weight > dec!(0.40) {
            warnings.push(format!(
                "Concentrated position: {} has weight {:.4}",
                a.symbol, a.weight
            ));
        }
    }
    if hhi > dec!(0.5) {
        warnings.push(format!("High concentration: HHI = {:.4}", hhi));
    }
    if volatility > dec!(0.30) {
        warnings.push(format!("High portfolio volatility: {:.4}", volatility));
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> Vec<Asset> {
        vec![
            Asset {
                symbol: "GROWTH".into(),
                name: "Growth Equity".into(),
                expected_return: dec!(0.12),
                volatility: dec!(0.25),
                price: dec!(200),
            },
            Asset {
                symbol: "INCOME".into(),
                name: "Investment Grade Credit".into(),
                expected_return: dec!(0.08),
                volatility: dec!(0.15),
                price: dec!(50),
            },
        ]
    }

    fn input(weights: Vec<Decimal>, portfolio_value: Option<Decimal>) -> AllocationInput {
        AllocationInput {
            assets: assets(),
            weights,
            risk_free_rate: dec!(0.02),
            portfolio_value,
        }
    }

    // ------------------------------------------------------------------
    // 1. Money amounts and units follow the weights
    // ------------------------------------------------------------------
    #[test]
    fn test_values_and_units() {
        let out = build_allocation_report(&input(vec![dec!(0.4), dec!(0.6)], Some(dec!(100000))))
            .unwrap();
        let a = &out.result.allocations;
        assert_eq!(a[0].allocated_value, Some(dec!(40000)));
        assert_eq!(a[0].units, Some(dec!(200)));
        assert_eq!(a[1].allocated_value, Some(dec!(60000)));
        assert_eq!(a[1].units, Some(dec!(1200)));
    }

    // ------------------------------------------------------------------
    // 2. Risk contributions add up to portfolio volatility
    // ------------------------------------------------------------------
    #[test]
    fn test_risk_contributions_sum_to_volatility() {
        let out = build_allocation_report(&input(vec![dec!(0.3), dec!(0.7)], None)).unwrap();
        let r = &out.result;
        let total_risk: Decimal = r.allocations.iter().map(|a| a.contribution_to_risk).sum();
        assert!((total_risk - r.volatility).abs() < dec!(0.0000000001));
        let total_ret: Decimal = r.allocations.iter().map(|a| a.contribution_to_return).sum();
        assert_eq!(total_ret, r.expected_return);
        assert!(r.allocations[0].allocated_value.is_none());
    }

    // ------------------------------------------------------------------
    // 3. Diversification and concentration
    // ------------------------------------------------------------------
    #[test]
    fn test_diversification_and_hhi() {
        let out = build_allocation_report(&input(vec![dec!(0.5), dec!(0.5)], None)).unwrap();
        let r = &out.result;
        assert_eq!(r.hhi_concentration, dec!(0.5));
        // Imperfect correlation always diversifies.
        assert!(r.diversification_ratio > Decimal::ONE);
    }

    // ------------------------------------------------------------------
    // 4. Warnings
    // ------------------------------------------------------------------
    #[test]
    fn test_concentration_warnings() {
        let out = build_allocation_report(&input(vec![dec!(0.9), dec!(0.1)], None)).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("Concentrated position: GROWTH")));
        assert!(out.warnings.iter().any(|w| w.contains("HHI")));
    }

    #[test]
    fn test_unnormalised_weights_warn() {
        let out = build_allocation_report(&input(vec![dec!(0.3), dec!(0.3)], None)).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("not 1")));
    }

    // ------------------------------------------------------------------
    // 5. Invalid inputs
    // ------------------------------------------------------------------
    #[test]
    fn test_zero_price_rejected_with_value() {
        let mut inp = input(vec![dec!(0.5), dec!(0.5)], Some(dec!(1000)));
        inp.assets[1].price = Decimal::ZERO;
        assert!(matches!(
            build_allocation_report(&inp),
            Err(OptimizerError::InvalidInput { ref field, .. }) if field == "price"
        ));

        // Without a portfolio value the price is never used.
        inp.portfolio_value = None;
        assert!(build_allocation_report(&inp).is_ok());
    }

    #[test]
    fn test_misaligned_weights_rejected() {
        assert!(build_allocation_report(&input(vec![dec!(1)], None)).is_err());
    }

    #[test]
    fn test_zero_volatility_rejected() {
        let mut inp = input(vec![dec!(0.5), dec!(0.5)], None);
        for a in inp.assets.iter_mut() {
            a.volatility = Decimal::ZERO;
        }
        assert!(matches!(
            build_allocation_report(&inp),
            Err(OptimizerError::DegenerateVolatility { .. })
        ));
    }
}

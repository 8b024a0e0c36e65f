use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::covariance::{build_covariance, CovarianceMatrix};
use super::objective::{portfolio_return, portfolio_volatility};
use crate::error::OptimizerError;
use crate::types::{with_metadata, Asset, ComputationOutput, PortfolioMetrics, Rate};
use crate::OptimizerResult;

/// Ad-hoc "what-if" evaluation of a caller-chosen weight vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsInput {
    pub assets: Vec<Asset>,
    pub weights: Vec<Rate>,
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: Rate,
}

fn default_risk_free_rate() -> Rate {
    dec!(0.02)
}

/// [`calculate_metrics`] wrapped in the standard output envelope.
pub fn portfolio_metrics(
    input: &MetricsInput,
) -> OptimizerResult<ComputationOutput<PortfolioMetrics>> {
    let start = Instant::now();
    let metrics = calculate_metrics(&input.assets, &input.weights, input.risk_free_rate)?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio return, volatility and Sharpe ratio (constant-correlation covariance)",
        &serde_json::json!({
            "n_assets": input.assets.len(),
            "risk_free_rate": input.risk_free_rate.to_string(),
        }),
        Vec::new(),
        elapsed,
        metrics,
    ))
}

/// Expected return, volatility and Sharpe ratio for arbitrary weights.
///
/// This is a reporting function: weights need not sum to one or respect any
/// bound, but they must be positionally aligned with `assets`.
pub fn calculate_metrics(
    assets: &[Asset],
    weights: &[Decimal],
    risk_free_rate: Rate,
) -> OptimizerResult<PortfolioMetrics> {
    if weights.len() != assets.len() {
        return Err(OptimizerError::InvalidInput {
            field: "weights".into(),
            reason: format!(
                "Expected {} weights (one per asset) but got {}",
                assets.len(),
                weights.len()
            ),
        });
    }
    let cov = build_covariance(assets);
    let expected_returns: Vec<Decimal> = assets.iter().map(|a| a.expected_return).collect();
    metrics_with_covariance(weights, &expected_returns, &cov, risk_free_rate)
}

/// Same as [`calculate_metrics`] against a pre-built covariance matrix.
pub(crate) fn metrics_with_covariance(
    weights: &[Decimal],
    expected_returns: &[Decimal],
    cov: &CovarianceMatrix,
    risk_free_rate: Rate,
) -> OptimizerResult<PortfolioMetrics> {
    let expected_return = portfolio_return(weights, expected_returns);
    let volatility = portfolio_volatility(weights, cov, "metrics")?;
    Ok(PortfolioMetrics {
        expected_return,
        volatility,
        sharpe_ratio: (expected_return - risk_free_rate) / volatility,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assets() -> Vec<Asset> {
        vec![
            Asset {
                symbol: "GROWTH".into(),
                name: "Growth Equity".into(),
                expected_return: dec!(0.12),
                volatility: dec!(0.25),
                price: dec!(210.50),
            },
            Asset {
                symbol: "INCOME".into(),
                name: "Investment Grade Credit".into(),
                expected_return: dec!(0.08),
                volatility: dec!(0.15),
                price: dec!(98.20),
            },
        ]
    }

    #[test]
    fn test_equal_weight_metrics() {
        let m = calculate_metrics(&assets(), &[dec!(0.5), dec!(0.5)], dec!(0.02)).unwrap();
        assert_eq!(m.expected_return, dec!(0.10));
        assert!((m.volatility - dec!(0.16393596310755)).abs() < dec!(0.0000000001));
        assert!((m.sharpe_ratio - dec!(0.48799542506433)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_single_asset_held_alone() {
        let m = calculate_metrics(&assets(), &[Decimal::ONE, Decimal::ZERO], dec!(0.02)).unwrap();
        assert_eq!(m.expected_return, dec!(0.12));
        assert!((m.volatility - dec!(0.25)).abs() < dec!(0.0000000001));
        assert!((m.sharpe_ratio - dec!(0.4)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_idempotent() {
        let w = [dec!(0.37), dec!(0.63)];
        let first = calculate_metrics(&assets(), &w, dec!(0.02)).unwrap();
        let second = calculate_metrics(&assets(), &w, dec!(0.02)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unnormalised_weights_are_reported() {
        // 120% gross exposure is allowed for what-if analysis.
        let m = calculate_metrics(&assets(), &[dec!(0.6), dec!(0.6)], dec!(0.02)).unwrap();
        assert_eq!(m.expected_return, dec!(0.12));
    }

    #[test]
    fn test_misaligned_weights_rejected() {
        let err = calculate_metrics(&assets(), &[Decimal::ONE], dec!(0.02)).unwrap_err();
        assert!(matches!(
            err,
            OptimizerError::InvalidInput { ref field, .. } if field == "weights"
        ));
    }

    #[test]
    fn test_zero_volatility_rejected() {
        let mut a = assets();
        for asset in a.iter_mut() {
            asset.volatility = Decimal::ZERO;
        }
        let err = calculate_metrics(&a, &[dec!(0.5), dec!(0.5)], dec!(0.02)).unwrap_err();
        assert!(matches!(err, OptimizerError::DegenerateVolatility { .. }));
    }

    #[test]
    fn test_envelope_defaults_risk_free_rate() {
        let input: MetricsInput = serde_json::from_value(serde_json::json!({
            "assets": assets(),
            "weights": ["0.5", "0.5"]
        }))
        .unwrap();
        assert_eq!(input.risk_free_rate, dec!(0.02));
        let out = portfolio_metrics(&input).unwrap();
        assert_eq!(out.result.expected_return, dec!(0.10));
        assert!(out.warnings.is_empty());
    }
}

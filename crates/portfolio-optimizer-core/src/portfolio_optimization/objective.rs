use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use super::covariance::CovarianceMatrix;
use crate::error::OptimizerError;
use crate::OptimizerResult;

// ---------------------------------------------------------------------------
// Portfolio moments
// ---------------------------------------------------------------------------

/// R(w) = sum_i w_i * r_i
pub fn portfolio_return(weights: &[Decimal], expected_returns: &[Decimal]) -> Decimal {
    weights
        .iter()
        .zip(expected_returns.iter())
        .map(|(w, r)| *w * *r)
        .sum()
}

/// V(w) = sum_i sum_j w_i * w_j * cov_ij
pub fn portfolio_variance(weights: &[Decimal], cov: &CovarianceMatrix) -> Decimal {
    let sigma_w = cov.mul_vec(weights);
    weights.iter().zip(sigma_w.iter()).map(|(w, s)| *w * *s).sum()
}

/// sigma(w) = sqrt(V(w)). Zero volatility is reported as degenerate.
pub fn portfolio_volatility(
    weights: &[Decimal],
    cov: &CovarianceMatrix,
    context: &str,
) -> OptimizerResult<Decimal> {
    let variance = portfolio_variance(weights, cov);
    if variance.is_zero() {
        return Err(OptimizerError::DegenerateVolatility {
            context: context.into(),
        });
    }
    if variance < Decimal::ZERO {
        return Err(OptimizerError::InvalidInput {
            field: "covariance_matrix".into(),
            reason: format!("Negative portfolio variance {} in {}", variance, context),
        });
    }
    let vol = variance.sqrt().unwrap_or(Decimal::ZERO);
    if vol.is_zero() {
        // variance below Decimal resolution
        return Err(OptimizerError::DegenerateVolatility {
            context: context.into(),
        });
    }
    Ok(vol)
}

/// S(w) = (R(w) - rf) / sigma(w)
pub fn sharpe_ratio(
    weights: &[Decimal],
    expected_returns: &[Decimal],
    cov: &CovarianceMatrix,
    risk_free_rate: Decimal,
) -> OptimizerResult<Decimal> {
    check_dimensions(weights, expected_returns, cov)?;
    let vol = portfolio_volatility(weights, cov, "sharpe_ratio")?;
    Ok((portfolio_return(weights, expected_returns) - risk_free_rate) / vol)
}

// ---------------------------------------------------------------------------
// Objective and gradient
// ---------------------------------------------------------------------------

/// Negated Sharpe ratio, the quantity the optimizer minimises.
pub fn objective(
    weights: &[Decimal],
    expected_returns: &[Decimal],
    cov: &CovarianceMatrix,
    risk_free_rate: Decimal,
) -> OptimizerResult<Decimal> {
    check_dimensions(weights, expected_returns, cov)?;
    let vol = portfolio_volatility(weights, cov, "objective")?;
    let excess = portfolio_return(weights, expected_returns) - risk_free_rate;
    Ok(-(excess / vol))
}

/// Analytic gradient of [`objective`] with respect to the weights.
///
/// dS/dw_i = (r_i * sigma - (R - rf) * dsigma/dw_i) / sigma^2, with
/// dsigma/dw_i = (2 * (Sigma w)_i) / (2 * sigma). Each component is negated to
/// match the minimisation objective.
pub fn gradient(
    weights: &[Decimal],
    expected_returns: &[Decimal],
    cov: &CovarianceMatrix,
    risk_free_rate: Decimal,
) -> OptimizerResult<Vec<Decimal>> {
    check_dimensions(weights, expected_returns, cov)?;
    let vol = portfolio_volatility(weights, cov, "gradient")?;
    let excess = portfolio_return(weights, expected_returns) - risk_free_rate;
    let vol_sq = vol * vol;
    let two = dec!(2);

    let sigma_w = cov.mul_vec(weights);
    let grad = expected_returns
        .iter()
        .zip(sigma_w.iter())
        .map(|(r, sw)| {
            let d_var = two * *sw;
            let d_vol = d_var / (two * vol);
            let d_sharpe = (*r * vol - excess * d_vol) / vol_sq;
            -d_sharpe
        })
        .collect();
    Ok(grad)
}

fn check_dimensions(
    weights: &[Decimal],
    expected_returns: &[Decimal],
    cov: &CovarianceMatrix,
) -> OptimizerResult<()> {
    let n = weights.len();
    if expected_returns.len() != n {
        return Err(OptimizerError::InvalidInput {
            field: "expected_returns".into(),
            reason: format!("Expected {} returns but got {}", n, expected_returns.len()),
        });
    }
    if cov.dim() != n {
        return Err(OptimizerError::InvalidInput {
            field: "covariance_matrix".into(),
            reason: format!("Expected {}x{} matrix but got {}x{}", n, n, cov.dim(), cov.dim()),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio_optimization::covariance::build_covariance;
    use crate::types::Asset;

    fn asset(symbol: &str, ret: Decimal, vol: Decimal) -> Asset {
        Asset {
            symbol: symbol.into(),
            name: symbol.into(),
            expected_return: ret,
            volatility: vol,
            price: dec!(50),
        }
    }

    fn scenario_a() -> (Vec<Decimal>, CovarianceMatrix) {
        let assets = vec![
            asset("GROWTH", dec!(0.12), dec!(0.25)),
            asset("INCOME", dec!(0.08), dec!(0.15)),
        ];
        let returns = assets.iter().map(|a| a.expected_return).collect();
        (returns, build_covariance(&assets))
    }

    fn close(a: Decimal, b: Decimal, tol: Decimal) -> bool {
        (a - b).abs() < tol
    }

    // ------------------------------------------------------------------
    // 1. Moments at the equal-weight point
    // ------------------------------------------------------------------
    #[test]
    fn test_moments_equal_weights() {
        let (mu, cov) = scenario_a();
        let w = vec![dec!(0.5), dec!(0.5)];
        assert_eq!(portfolio_return(&w, &mu), dec!(0.10));
        assert_eq!(portfolio_variance(&w, &cov), dec!(0.026875));
        let vol = portfolio_volatility(&w, &cov, "test").unwrap();
        assert!(close(vol, dec!(0.16393596310755), dec!(0.0000000001)));
    }

    // ------------------------------------------------------------------
    // 2. Objective is the negated Sharpe ratio
    // ------------------------------------------------------------------
    #[test]
    fn test_objective_is_negated_sharpe() {
        let (mu, cov) = scenario_a();
        let w = vec![dec!(0.5), dec!(0.5)];
        let obj = objective(&w, &mu, &cov, dec!(0.02)).unwrap();
        let sharpe = sharpe_ratio(&w, &mu, &cov, dec!(0.02)).unwrap();
        assert_eq!(obj, -sharpe);
        assert!(close(sharpe, dec!(0.487995425064335), dec!(0.000000001)));
    }

    // ------------------------------------------------------------------
    // 3. Analytic gradient at the equal-weight point
    // ------------------------------------------------------------------
    #[test]
    fn test_gradient_values() {
        let (mu, cov) = scenario_a();
        let w = vec![dec!(0.5), dec!(0.5)];
        let g = gradient(&w, &mu, &cov, dec!(0.02)).unwrap();
        assert_eq!(g.len(), 2);
        assert!(close(g[0], dec!(-0.062418019485), dec!(0.000000001)));
        assert!(close(g[1], dec!(-0.181579693047), dec!(0.000000001)));
    }

    // ------------------------------------------------------------------
    // 4. Analytic gradient agrees with central differences
    // ------------------------------------------------------------------
    #[test]
    fn test_gradient_matches_finite_differences() {
        let assets = vec![
            asset("A", dec!(0.10), dec!(0.20)),
            asset("B", dec!(0.06), dec!(0.10)),
            asset("C", dec!(0.07), dec!(0.25)),
        ];
        let mu: Vec<Decimal> = assets.iter().map(|a| a.expected_return).collect();
        let cov = build_covariance(&assets);
        let w = vec![dec!(0.2), dec!(0.5), dec!(0.3)];
        let rf = dec!(0.03);
        let g = gradient(&w, &mu, &cov, rf).unwrap();

        let h = dec!(0.000001);
        for i in 0..3 {
            let mut up = w.clone();
            let mut down = w.clone();
            up[i] += h;
            down[i] -= h;
            let numeric = (objective(&up, &mu, &cov, rf).unwrap()
                - objective(&down, &mu, &cov, rf).unwrap())
                / (dec!(2) * h);
            assert!(
                close(g[i], numeric, dec!(0.00001)),
                "component {}: analytic {} vs numeric {}",
                i,
                g[i],
                numeric
            );
        }
    }

    // ------------------------------------------------------------------
    // 5. Zero volatility is reported, not propagated
    // ------------------------------------------------------------------
    #[test]
    fn test_zero_volatility_is_degenerate() {
        let assets = vec![
            asset("CASH1", dec!(0.03), Decimal::ZERO),
            asset("CASH2", dec!(0.04), Decimal::ZERO),
        ];
        let mu: Vec<Decimal> = assets.iter().map(|a| a.expected_return).collect();
        let cov = build_covariance(&assets);
        let w = vec![dec!(0.5), dec!(0.5)];

        assert!(matches!(
            objective(&w, &mu, &cov, dec!(0.02)),
            Err(OptimizerError::DegenerateVolatility { .. })
        ));
        assert!(matches!(
            gradient(&w, &mu, &cov, dec!(0.02)),
            Err(OptimizerError::DegenerateVolatility { .. })
        ));
    }

    // ------------------------------------------------------------------
    // 6. Zero weights collapse volatility too
    // ------------------------------------------------------------------
    #[test]
    fn test_zero_weights_are_degenerate() {
        let (mu, cov) = scenario_a();
        let w = vec![Decimal::ZERO, Decimal::ZERO];
        assert!(matches!(
            objective(&w, &mu, &cov, dec!(0.02)),
            Err(OptimizerError::DegenerateVolatility { .. })
        ));
    }

    // ------------------------------------------------------------------
    // 7. Misaligned inputs
    // ------------------------------------------------------------------
    #[test]
    fn test_dimension_mismatch() {
        let (mu, cov) = scenario_a();
        let w = vec![dec!(1)];
        assert!(matches!(
            objective(&w, &mu, &cov, dec!(0.02)),
            Err(OptimizerError::InvalidInput { .. })
        ));
        assert!(matches!(
            gradient(&[dec!(0.5), dec!(0.5)], &mu[..1], &cov, dec!(0.02)),
            Err(OptimizerError::InvalidInput { .. })
        ));
    }

    // ------------------------------------------------------------------
    // 8. Risk-free rate above every return gives a negative Sharpe
    // ------------------------------------------------------------------
    #[test]
    fn test_negative_excess_return() {
        let (mu, cov) = scenario_a();
        let w = vec![dec!(0.5), dec!(0.5)];
        let sharpe = sharpe_ratio(&w, &mu, &cov, dec!(0.20)).unwrap();
        assert!(sharpe < Decimal::ZERO);
        assert!(objective(&w, &mu, &cov, dec!(0.20)).unwrap() > Decimal::ZERO);
    }
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::OptimizerError;
use crate::types::{with_metadata, Asset, ComputationOutput};
use crate::OptimizerResult;

/// Pairwise correlation assumed between every pair of distinct assets.
pub const CONSTANT_CORRELATION: Decimal = dec!(0.3);

/// Square, symmetric covariance matrix. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CovarianceMatrix {
    rows: Vec<Vec<Decimal>>,
}

impl CovarianceMatrix {
    /// Wrap externally estimated covariances.
    ///
    /// Rows must form a square matrix that is symmetric to within 1e-7.
    #[allow(clippy::needless_range_loop)]
    pub fn from_rows(rows: Vec<Vec<Decimal>>) -> OptimizerResult<Self> {
        let n = rows.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(OptimizerError::InvalidInput {
                    field: "covariance_matrix".into(),
                    reason: format!("Row {} has {} columns, expected {}", i, row.len(), n),
                });
            }
        }
        let tolerance = dec!(0.0000001);
        for i in 0..n {
            for j in (i + 1)..n {
                if (rows[i][j] - rows[j][i]).abs() > tolerance {
                    return Err(OptimizerError::InvalidInput {
                        field: "covariance_matrix".into(),
                        reason: format!(
                            "Not symmetric: [{},{}]={} != [{},{}]={}",
                            i, j, rows[i][j], j, i, rows[j][i]
                        ),
                    });
                }
            }
        }
        Ok(Self { rows })
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, i: usize, j: usize) -> Decimal {
        self.rows[i][j]
    }

    pub fn row(&self, i: usize) -> &[Decimal] {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[Vec<Decimal>] {
        &self.rows
    }

    /// Sigma * w.
    pub fn mul_vec(&self, w: &[Decimal]) -> Vec<Decimal> {
        self.rows
            .iter()
            .map(|row| row.iter().zip(w.iter()).map(|(c, x)| *c * *x).sum())
            .collect()
    }
}

/// Build the constant-correlation covariance matrix for `assets`.
///
/// Diagonal: `vol_i^2`. Off-diagonal: `0.3 * vol_i * vol_j`.
pub fn build_covariance(assets: &[Asset]) -> CovarianceMatrix {
    let rows = assets
        .iter()
        .enumerate()
        .map(|(i, a)| {
            assets
                .iter()
                .enumerate()
                .map(|(j, b)| {
                    if i == j {
                        a.volatility * a.volatility
                    } else {
                        CONSTANT_CORRELATION * a.volatility * b.volatility
                    }
                })
                .collect()
        })
        .collect();
    CovarianceMatrix { rows }
}

/// Input for a standalone covariance estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CovarianceInput {
    pub assets: Vec<Asset>,
}

/// [`build_covariance`] wrapped in the standard output envelope.
pub fn estimate_covariance(input: &CovarianceInput) -> ComputationOutput<CovarianceMatrix> {
    let start = Instant::now();
    let cov = build_covariance(&input.assets);
    let mut warnings = Vec::new();
    if input.assets.len() < 2 {
        warnings.push(format!(
            "{} asset(s) supplied; optimization needs at least 2",
            input.assets.len()
        ));
    }
    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Constant-correlation covariance from asset volatilities",
        &serde_json::json!({
            "n_assets": input.assets.len(),
            "correlation": CONSTANT_CORRELATION.to_string(),
        }),
        warnings,
        elapsed,
        cov,
    )
}

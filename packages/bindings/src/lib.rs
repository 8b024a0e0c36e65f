use napi::Result as NapiResult;
use napi_derive::napi;

use portfolio_optimizer_core::portfolio_optimization::{
    allocation, covariance, metrics, optimizer,
};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Portfolio optimization
// ---------------------------------------------------------------------------

#[napi]
pub fn optimize_portfolio(input_json: String) -> NapiResult<String> {
    let input: optimizer::OptimizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = optimizer::optimize_portfolio(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn portfolio_metrics(input_json: String) -> NapiResult<String> {
    let input: metrics::MetricsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = metrics::portfolio_metrics(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn covariance_matrix(input_json: String) -> NapiResult<String> {
    let input: covariance::CovarianceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = covariance::estimate_covariance(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[napi]
pub fn allocation_report(input_json: String) -> NapiResult<String> {
    let input: allocation::AllocationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = allocation::build_allocation_report(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

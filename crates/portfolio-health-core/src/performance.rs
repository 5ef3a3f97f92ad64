use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};
use std::collections::BTreeMap;

use crate::risk::covariance::RiskOutput;
use crate::types::{Asset, AssumptionSet};

/// Number of trapezoidal steps for the downside-deviation quadrature.
const QUADRATURE_STEPS: usize = 240;
/// Integration domain half-width in standard deviations.
const QUADRATURE_SIGMAS: f64 = 6.0;

/// Return and risk-adjusted-return metrics for one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceOutput {
    /// Weighted per-asset expected return (CAPM with overrides).
    pub expected_return: f64,
    /// (E[R] − rf) / volatility; 0 when volatility <= 0.
    pub sharpe: f64,
    /// (E[R] − target) / downside deviation; 0 when the deviation is <= 0.
    pub sortino: f64,
    /// Gaussian-quadrature downside deviation below the target return.
    pub downside_deviation: f64,
    /// CAPM alpha versus the benchmark.
    pub alpha: f64,
    /// Closed-form tracking error versus the benchmark.
    pub tracking_error: f64,
    /// (E[R] − benchmark) / tracking error; `None` when TE is 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information_ratio: Option<f64>,
    /// Weighted portfolio expense ratio.
    pub expense_ratio: f64,
}

/// Per-asset expected return: explicit override when present, CAPM
/// otherwise. Missing betas default to 1 so an unclassified asset tracks
/// the benchmark.
fn asset_expected_return(asset: &Asset, assumptions: &AssumptionSet) -> f64 {
    if let Some(er) = asset.expected_return_override {
        if er.is_finite() {
            return er;
        }
    }
    let beta = if asset.beta.is_finite() { asset.beta } else { 1.0 };
    assumptions.risk_free_rate + beta * (assumptions.benchmark_return - assumptions.risk_free_rate)
}

/// Downside deviation below `target` for a Gaussian return distribution
/// with the given mean and standard deviation.
///
/// Numerically integrates the squared shortfall weighted by the normal
/// density over mean ± 6σ with trapezoidal quadrature, then square-roots
/// the semivariance.
pub fn gaussian_downside_deviation(mean: f64, std_dev: f64, target: f64) -> f64 {
    if !(std_dev > 0.0) || !std_dev.is_finite() || !mean.is_finite() {
        return 0.0;
    }
    let density = match Normal::new(mean, std_dev) {
        Ok(d) => d,
        Err(_) => return 0.0,
    };

    let lo = mean - QUADRATURE_SIGMAS * std_dev;
    let hi = mean + QUADRATURE_SIGMAS * std_dev;
    let step = (hi - lo) / QUADRATURE_STEPS as f64;

    let integrand = |x: f64| {
        let shortfall = (target - x).max(0.0);
        shortfall * shortfall * density.pdf(x)
    };

    let mut semivariance = 0.5 * (integrand(lo) + integrand(hi));
    for i in 1..QUADRATURE_STEPS {
        semivariance += integrand(lo + i as f64 * step);
    }
    semivariance *= step;

    semivariance.max(0.0).sqrt()
}

/// Compute the return/performance metric family.
///
/// Every degenerate denominator maps to 0 or `None` rather than a
/// non-finite value.
pub fn portfolio_performance(
    assets: &[Asset],
    weights: &BTreeMap<String, f64>,
    assumptions: &AssumptionSet,
    risk: &RiskOutput,
) -> PerformanceOutput {
    let mut expected_return = 0.0;
    let mut expense_ratio = 0.0;
    for asset in assets {
        let w = weights.get(&asset.ticker).copied().unwrap_or(0.0);
        if !(w.is_finite() && w > 0.0) {
            continue;
        }
        expected_return += w * asset_expected_return(asset, assumptions);
        if asset.expense_ratio.is_finite() && asset.expense_ratio > 0.0 {
            expense_ratio += w * asset.expense_ratio;
        }
    }

    let rf = assumptions.risk_free_rate;
    let sharpe = if risk.volatility > 0.0 {
        (expected_return - rf) / risk.volatility
    } else {
        0.0
    };

    let target = rf;
    let downside_deviation = gaussian_downside_deviation(expected_return, risk.volatility, target);
    let sortino = if downside_deviation > 0.0 {
        (expected_return - target) / downside_deviation
    } else {
        0.0
    };

    let alpha = expected_return - rf - risk.beta * (assumptions.benchmark_return - rf);

    let bench_var = assumptions.benchmark_volatility * assumptions.benchmark_volatility;
    let tracking_error =
        (risk.variance + bench_var - 2.0 * risk.beta * bench_var).max(0.0).sqrt();
    let information_ratio = if tracking_error > 0.0 {
        Some((expected_return - assumptions.benchmark_return) / tracking_error)
    } else {
        None
    };

    PerformanceOutput {
        expected_return,
        sharpe,
        sortino,
        downside_deviation,
        alpha,
        tracking_error,
        information_ratio,
        expense_ratio,
    }
}

/// Calmar ratio: expected return over the magnitude of maximum drawdown.
/// 0 when the drawdown is unavailable or 0.
pub fn calmar_ratio(expected_return: f64, max_drawdown: Option<f64>) -> f64 {
    match max_drawdown {
        Some(dd) if dd.abs() > 0.0 && dd.is_finite() => expected_return / dd.abs(),
        _ => 0.0,
    }
}

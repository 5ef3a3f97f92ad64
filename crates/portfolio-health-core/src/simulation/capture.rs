use serde::{Deserialize, Serialize};

use super::generator::PathGenerator;
use super::{monthly_params, HORIZON_MONTHS};

/// Fixed seed for the paired benchmark/portfolio path.
const CAPTURE_SEED: u64 = 555_555_555;

/// Benchmark subset means below this magnitude leave the ratio undefined.
const MEAN_EPSILON: f64 = 1e-9;

/// Up/down capture ratios versus the benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureOutput {
    /// Portfolio ÷ benchmark geometric mean over benchmark-up months.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_capture: Option<f64>,
    /// Portfolio ÷ benchmark geometric mean over benchmark-down months.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_capture: Option<f64>,
    /// Benchmark-up months in the simulated horizon.
    pub up_months: usize,
    /// Benchmark-down months in the simulated horizon.
    pub down_months: usize,
}

/// Geometric mean periodic return of a subset of months.
fn geometric_mean(returns: &[f64]) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut compound = 1.0_f64;
    for r in returns {
        let growth = 1.0 + r;
        if growth <= 0.0 {
            return None;
        }
        compound *= growth;
    }
    Some(compound.powf(1.0 / returns.len() as f64) - 1.0)
}

/// Simulate paired benchmark/portfolio monthly returns and compute
/// up/down capture ratios.
///
/// Each month the portfolio return is the systematic component
/// `beta * benchmarkShock` plus an independent residual draw whose
/// volatility is `sqrt(max(portfolioVariance - (beta * benchmarkVol)^2, 0))`.
/// Months are split on the sign of the benchmark return (0 counts as up);
/// a ratio is `None` when its benchmark subset is empty or its geometric
/// mean is ~0.
pub fn simulate_capture_ratios(
    portfolio_variance: f64,
    beta: f64,
    benchmark_return: f64,
    benchmark_volatility: f64,
) -> CaptureOutput {
    let empty = CaptureOutput {
        up_capture: None,
        down_capture: None,
        up_months: 0,
        down_months: 0,
    };
    if !(benchmark_volatility > 0.0)
        || !benchmark_volatility.is_finite()
        || !benchmark_return.is_finite()
        || !beta.is_finite()
        || !portfolio_variance.is_finite()
    {
        return empty;
    }

    let (bench_mean, bench_vol) = monthly_params(benchmark_return, benchmark_volatility);
    let systematic = beta * benchmark_volatility;
    let residual_annual = (portfolio_variance.max(0.0) - systematic * systematic)
        .max(0.0)
        .sqrt();
    let residual_vol = residual_annual / 12.0_f64.sqrt();

    let mut generator = PathGenerator::new(CAPTURE_SEED);
    let mut up_bench = Vec::new();
    let mut up_port = Vec::new();
    let mut down_bench = Vec::new();
    let mut down_port = Vec::new();

    for _ in 0..HORIZON_MONTHS {
        let shock = bench_mean + bench_vol * generator.next_standard_normal();
        let port = beta * shock + residual_vol * generator.next_standard_normal();
        if shock >= 0.0 {
            up_bench.push(shock);
            up_port.push(port);
        } else {
            down_bench.push(shock);
            down_port.push(port);
        }
    }

    let ratio = |bench: &[f64], port: &[f64]| -> Option<f64> {
        let bench_mean = geometric_mean(bench)?;
        let port_mean = geometric_mean(port)?;
        if bench_mean.abs() < MEAN_EPSILON {
            return None;
        }
        Some(port_mean / bench_mean)
    };

    CaptureOutput {
        up_capture: ratio(&up_bench, &up_port),
        down_capture: ratio(&down_bench, &down_port),
        up_months: up_bench.len(),
        down_months: down_bench.len(),
    }
}

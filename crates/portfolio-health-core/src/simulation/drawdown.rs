use serde::{Deserialize, Serialize};

use super::generator::PathGenerator;
use super::{monthly_params, HORIZON_MONTHS};

/// Fixed seed so repeated runs on the same inputs are byte-identical.
const DRAWDOWN_SEED: u64 = 987_654_321;
/// Number of independent equity paths.
const NUM_PATHS: usize = 60;
/// Cap on the reported mean drawdown.
const MAX_REPORTED_DRAWDOWN: f64 = 0.95;

const TRADING_DAYS_PER_MONTH: f64 = 21.0;
const CALENDAR_DAYS_PER_MONTH: f64 = 30.0;

/// Drawdown/recovery detail for a single simulated path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathDetail {
    /// Maximum peak-to-trough decline on this path.
    pub max_drawdown: f64,
    /// Months from the trough until the pre-drawdown peak was regained;
    /// `None` if the path never recovered within the horizon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_months: Option<u32>,
}

/// Aggregated drawdown/recovery simulation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownOutput {
    /// Mean of per-path maximum drawdowns, capped at 0.95.
    pub mean_max_drawdown: f64,
    /// Mean recovery time across paths that did recover.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_recovery_months: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_recovery_trading_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_recovery_calendar_days: Option<f64>,
    /// Number of paths that regained their pre-drawdown peak.
    pub recovered_paths: usize,
    /// Total simulated paths.
    pub paths: usize,
    /// The single worst path, kept for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_path: Option<PathDetail>,
}

impl DrawdownOutput {
    fn degenerate() -> Self {
        Self {
            mean_max_drawdown: 0.0,
            mean_recovery_months: None,
            mean_recovery_trading_days: None,
            mean_recovery_calendar_days: None,
            recovered_paths: 0,
            paths: 0,
            worst_path: None,
        }
    }
}

/// Simulate one equity path and measure its worst drawdown and recovery.
fn simulate_path(generator: &mut PathGenerator, monthly_mean: f64, monthly_vol: f64) -> PathDetail {
    let mut equity = Vec::with_capacity(HORIZON_MONTHS + 1);
    equity.push(1.0_f64);
    for _ in 0..HORIZON_MONTHS {
        let r = monthly_mean + monthly_vol * generator.next_standard_normal();
        let next = equity.last().unwrap() * (1.0 + r).max(0.0);
        equity.push(next);
    }

    let mut peak = equity[0];
    let mut max_drawdown = 0.0;
    let mut trough_index = 0;
    let mut peak_at_max = equity[0];
    for (i, &value) in equity.iter().enumerate() {
        if value > peak {
            peak = value;
        }
        let dd = if peak > 0.0 { (peak - value) / peak } else { 1.0 };
        if dd > max_drawdown {
            max_drawdown = dd;
            trough_index = i;
            peak_at_max = peak;
        }
    }

    let recovery_months = if max_drawdown == 0.0 {
        Some(0)
    } else {
        equity[trough_index + 1..]
            .iter()
            .position(|&v| v >= peak_at_max)
            .map(|offset| (offset + 1) as u32)
    };

    PathDetail {
        max_drawdown,
        recovery_months,
    }
}

/// Run the drawdown/recovery simulation: 60 independent 120-month equity
/// paths from the annualised expected return and volatility.
///
/// Returns the degenerate (all-zero) output when volatility is not
/// positive.
pub fn simulate_drawdowns(annual_return: f64, annual_volatility: f64) -> DrawdownOutput {
    if !(annual_volatility > 0.0) || !annual_volatility.is_finite() || !annual_return.is_finite() {
        return DrawdownOutput::degenerate();
    }

    let (monthly_mean, monthly_vol) = monthly_params(annual_return, annual_volatility);
    let mut generator = PathGenerator::new(DRAWDOWN_SEED);

    let mut details = Vec::with_capacity(NUM_PATHS);
    for _ in 0..NUM_PATHS {
        details.push(simulate_path(&mut generator, monthly_mean, monthly_vol));
    }

    let mean_max_drawdown = (details.iter().map(|d| d.max_drawdown).sum::<f64>()
        / NUM_PATHS as f64)
        .min(MAX_REPORTED_DRAWDOWN);

    let recovered: Vec<u32> = details.iter().filter_map(|d| d.recovery_months).collect();
    let mean_recovery_months = if recovered.is_empty() {
        None
    } else {
        Some(recovered.iter().map(|&m| m as f64).sum::<f64>() / recovered.len() as f64)
    };

    let worst_path = details
        .iter()
        .max_by(|a, b| a.max_drawdown.total_cmp(&b.max_drawdown))
        .cloned();

    DrawdownOutput {
        mean_max_drawdown,
        mean_recovery_months,
        mean_recovery_trading_days: mean_recovery_months.map(|m| m * TRADING_DAYS_PER_MONTH),
        mean_recovery_calendar_days: mean_recovery_months.map(|m| m * CALENDAR_DAYS_PER_MONTH),
        recovered_paths: recovered.len(),
        paths: NUM_PATHS,
        worst_path,
    }
}

pub mod capture;
pub mod drawdown;
pub mod generator;
pub mod tail_risk;

/// Months per simulated path.
pub const HORIZON_MONTHS: usize = 120;

/// Monthly mean/volatility pair derived from annualised inputs.
pub(crate) fn monthly_params(annual_return: f64, annual_volatility: f64) -> (f64, f64) {
    (annual_return / 12.0, annual_volatility / 12.0_f64.sqrt())
}

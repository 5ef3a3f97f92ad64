use serde::{Deserialize, Serialize};

use super::generator::PathGenerator;
use super::{monthly_params, HORIZON_MONTHS};

/// Fixed seed for the tail-risk path.
const TAIL_SEED: u64 = 123_456_789;

/// Empirical monthly VaR/CVaR from one simulated return path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailRiskOutput {
    /// Confidence level the quantile was taken at.
    pub confidence_level: f64,
    /// Loss at the (1 − confidence) quantile of the simulated months.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_at_risk: Option<f64>,
    /// Mean loss over the worst (1 − confidence) fraction of months.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_value_at_risk: Option<f64>,
}

/// Simulate one 120-month return path and read VaR/CVaR off its empirical
/// loss distribution.
///
/// The confidence level is clamped to [0.5, 0.999]; non-positive volatility
/// yields `None` metrics.
pub fn simulate_tail_risk(
    annual_return: f64,
    annual_volatility: f64,
    confidence_level: f64,
) -> TailRiskOutput {
    let confidence_level = if confidence_level.is_finite() {
        confidence_level.clamp(0.5, 0.999)
    } else {
        0.95
    };

    if !(annual_volatility > 0.0) || !annual_volatility.is_finite() || !annual_return.is_finite() {
        return TailRiskOutput {
            confidence_level,
            value_at_risk: None,
            conditional_value_at_risk: None,
        };
    }

    let (monthly_mean, monthly_vol) = monthly_params(annual_return, annual_volatility);
    let mut generator = PathGenerator::new(TAIL_SEED);

    // Losses are negated returns, sorted worst-first.
    let mut losses: Vec<f64> = (0..HORIZON_MONTHS)
        .map(|_| -(monthly_mean + monthly_vol * generator.next_standard_normal()))
        .collect();
    losses.sort_by(|a, b| b.total_cmp(a));

    let tail_len = (((1.0 - confidence_level) * HORIZON_MONTHS as f64).floor() as usize).max(1);
    let value_at_risk = losses[tail_len - 1];
    let conditional_value_at_risk = losses[..tail_len].iter().sum::<f64>() / tail_len as f64;

    TailRiskOutput {
        confidence_level,
        value_at_risk: Some(value_at_risk),
        conditional_value_at_risk: Some(conditional_value_at_risk),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_across_calls() {
        let a = simulate_tail_risk(0.08, 0.16, 0.95);
        let b = simulate_tail_risk(0.08, 0.16, 0.95);
        assert_eq!(a.value_at_risk.unwrap().to_bits(), b.value_at_risk.unwrap().to_bits());
        assert_eq!(
            a.conditional_value_at_risk.unwrap().to_bits(),
            b.conditional_value_at_risk.unwrap().to_bits()
        );
    }

    #[test]
    fn test_cvar_at_least_var() {
        let out = simulate_tail_risk(0.08, 0.16, 0.95);
        assert!(out.conditional_value_at_risk.unwrap() >= out.value_at_risk.unwrap());
    }

    #[test]
    fn test_var_positive_for_risky_portfolio() {
        // 16% annualised volatility: the 95% monthly VaR should be a loss.
        let out = simulate_tail_risk(0.08, 0.16, 0.95);
        assert!(out.value_at_risk.unwrap() > 0.0);
    }

    #[test]
    fn test_higher_confidence_higher_var() {
        let var95 = simulate_tail_risk(0.08, 0.16, 0.95).value_at_risk.unwrap();
        let var99 = simulate_tail_risk(0.08, 0.16, 0.99).value_at_risk.unwrap();
        assert!(var99 >= var95);
    }

    #[test]
    fn test_zero_volatility_is_undefined() {
        let out = simulate_tail_risk(0.08, 0.0, 0.95);
        assert!(out.value_at_risk.is_none());
        assert!(out.conditional_value_at_risk.is_none());
    }

    #[test]
    fn test_confidence_clamped() {
        let out = simulate_tail_risk(0.08, 0.16, 1.5);
        assert_eq!(out.confidence_level, 0.999);
    }
}

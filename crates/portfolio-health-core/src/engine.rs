use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::allocation::guardrails::{assess_guardrails, GuardrailOutput};
use crate::allocation::weights::normalize_weights;
use crate::error::PortfolioHealthError;
use crate::health::{blend_health, HealthSummary};
use crate::performance::{calmar_ratio, portfolio_performance, PerformanceOutput};
use crate::risk::covariance::{portfolio_risk, RiskOutput};
use crate::risk::factors::{decompose_factors, FactorOutput};
use crate::scoring::composite::{composite_score, CompositeOutput};
use crate::scoring::metrics::MetricInputs;
use crate::simulation::capture::{simulate_capture_ratios, CaptureOutput};
use crate::simulation::drawdown::{simulate_drawdowns, DrawdownOutput};
use crate::simulation::tail_risk::{simulate_tail_risk, TailRiskOutput};
use crate::types::{with_metadata, Asset, AssumptionSet, ComputationOutput};
use crate::HealthResult;

/// The engine's sole output: every computed metric for one portfolio
/// snapshot, assembled fresh per call. Sub-computations return their own
/// records and the engine threads them forward; nothing is cached between
/// invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResult {
    /// Normalised target weights by ticker.
    pub target_weights: BTreeMap<String, f64>,
    /// Normalised current weights by ticker.
    pub current_weights: BTreeMap<String, f64>,
    /// Covariance-model risk metrics (current allocation).
    pub risk: RiskOutput,
    /// Return and risk-adjusted-return metrics.
    pub performance: PerformanceOutput,
    /// Expected return over mean simulated max drawdown; 0 when the
    /// drawdown simulation was degenerate.
    pub calmar: f64,
    pub drawdown: DrawdownOutput,
    pub tail_risk: TailRiskOutput,
    pub capture: CaptureOutput,
    pub factors: FactorOutput,
    pub composite: CompositeOutput,
    pub guardrails: GuardrailOutput,
    pub health: HealthSummary,
}

fn validate_assets(assets: &[Asset]) -> HealthResult<()> {
    if assets.is_empty() {
        return Err(PortfolioHealthError::InsufficientData(
            "At least one asset is required".into(),
        ));
    }
    let mut seen = BTreeSet::new();
    for asset in assets {
        if !seen.insert(asset.ticker.as_str()) {
            return Err(PortfolioHealthError::InvalidInput {
                field: "assets".into(),
                reason: format!("Duplicate ticker {}", asset.ticker),
            });
        }
    }
    Ok(())
}

/// Run the full analytics pipeline for one portfolio snapshot.
///
/// Pure and synchronous: identical inputs produce identical outputs, and
/// concurrent calls share no state. Errors are limited to structurally
/// malformed input (no assets, duplicate tickers, inconsistent factor
/// model); every numeric degeneracy degrades to a documented fallback and
/// surfaces through the envelope's warnings.
pub fn analyze_portfolio(
    assets: &[Asset],
    assumptions: &AssumptionSet,
) -> HealthResult<ComputationOutput<MetricsResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_assets(assets)?;

    let target_raw: BTreeMap<String, f64> = assets
        .iter()
        .map(|a| (a.ticker.clone(), a.target_weight_pct))
        .collect();
    let current_raw: BTreeMap<String, f64> = assets
        .iter()
        .map(|a| (a.ticker.clone(), a.current_pct))
        .collect();
    let target_weights = normalize_weights(&target_raw);
    let current_weights = normalize_weights(&current_raw);

    // Risk, return and simulation metrics describe the portfolio as it is
    // currently held; targets only enter the guardrail comparison.
    let risk = portfolio_risk(assets, &current_weights, &assumptions.correlations);
    let performance = portfolio_performance(assets, &current_weights, assumptions, &risk);

    if risk.volatility <= 0.0 {
        warnings.push(
            "Portfolio volatility is zero; simulation-based metrics are unavailable".into(),
        );
    }

    let drawdown = simulate_drawdowns(performance.expected_return, risk.volatility);
    let max_drawdown = if drawdown.paths > 0 {
        Some(drawdown.mean_max_drawdown)
    } else {
        None
    };
    let calmar = calmar_ratio(performance.expected_return, max_drawdown);

    let tail_risk = simulate_tail_risk(
        performance.expected_return,
        risk.volatility,
        assumptions.confidence_level,
    );

    let capture = simulate_capture_ratios(
        risk.variance,
        risk.beta,
        assumptions.benchmark_return,
        assumptions.benchmark_volatility,
    );

    let factors = decompose_factors(
        assets,
        &current_weights,
        &assumptions.factor_names,
        &assumptions.factor_covariance,
        risk.variance,
    )?;

    let composite = composite_score(&MetricInputs {
        sharpe: performance.sharpe,
        sortino: performance.sortino,
        alpha: performance.alpha,
        calmar,
        volatility: risk.volatility,
        beta: risk.beta,
        expense_ratio: performance.expense_ratio,
        diversification_index: risk.diversification.index,
        max_drawdown,
        cvar: tail_risk.conditional_value_at_risk,
        down_capture: capture.down_capture,
        r_squared: factors.r_squared,
    });
    if !composite.unscored.is_empty() {
        warnings.push(format!(
            "{} metric(s) could not be scored: {}",
            composite.unscored.len(),
            composite.unscored.join(", ")
        ));
    }

    let guardrails = assess_guardrails(
        assets,
        &target_weights,
        &current_weights,
        &assumptions.guardrail_policy,
    );
    if !guardrails.breaches.is_empty() {
        warnings.push(format!(
            "Guardrail breach on: {}",
            guardrails.breaches.join(", ")
        ));
    }

    let health = blend_health(&composite, &guardrails, assumptions.guardrail_weight);

    let result = MetricsResult {
        target_weights,
        current_weights,
        risk,
        performance,
        calmar,
        drawdown,
        tail_risk,
        capture,
        factors,
        composite,
        guardrails,
        health,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio Health Analytics (covariance risk model, deterministic Monte Carlo, factor decomposition, composite scoring, guardrail drift)",
        &serde_json::json!({
            "assets": assets.len(),
            "risk_free_rate": assumptions.risk_free_rate,
            "benchmark_return": assumptions.benchmark_return,
            "benchmark_volatility": assumptions.benchmark_volatility,
            "factors": assumptions.factor_names,
            "guardrail_weight": assumptions.guardrail_weight,
            "confidence_level": assumptions.confidence_level,
        }),
        warnings,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(ticker: &str, target: f64, current: f64, vol: f64, beta: f64) -> Asset {
        Asset {
            ticker: ticker.to_string(),
            target_weight_pct: target,
            current_pct: current,
            volatility: vol,
            beta,
            expense_ratio: 0.0015,
            expected_return_override: None,
            factor_loadings: None,
            residual_volatility: None,
            speculative: false,
        }
    }

    fn three_asset_portfolio() -> Vec<Asset> {
        vec![
            asset("VTI", 55.0, 58.0, 0.16, 1.0),
            asset("BND", 35.0, 32.0, 0.05, 0.1),
            asset("GLD", 10.0, 10.0, 0.14, 0.2),
        ]
    }

    #[test]
    fn test_empty_portfolio_rejected() {
        assert!(analyze_portfolio(&[], &AssumptionSet::default()).is_err());
    }

    #[test]
    fn test_duplicate_ticker_rejected() {
        let assets = vec![
            asset("VTI", 50.0, 50.0, 0.16, 1.0),
            asset("VTI", 50.0, 50.0, 0.16, 1.0),
        ];
        assert!(analyze_portfolio(&assets, &AssumptionSet::default()).is_err());
    }

    #[test]
    fn test_weights_normalised() {
        let out = analyze_portfolio(&three_asset_portfolio(), &AssumptionSet::default()).unwrap();
        let total: f64 = out.result.target_weights.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((out.result.target_weights["VTI"] - 0.55).abs() < 1e-12);
        assert!((out.result.current_weights["VTI"] - 0.58).abs() < 1e-12);
    }

    #[test]
    fn test_scores_within_bounds() {
        let out = analyze_portfolio(&three_asset_portfolio(), &AssumptionSet::default()).unwrap();
        let r = &out.result;
        assert!((0.0..=100.0).contains(&r.composite.score));
        assert!((0.0..=100.0).contains(&r.guardrails.score));
        assert!((0.0..=100.0).contains(&r.health.score));
    }

    #[test]
    fn test_metadata_reports_f64_precision() {
        let out = analyze_portfolio(&three_asset_portfolio(), &AssumptionSet::default()).unwrap();
        assert_eq!(out.metadata.precision, "ieee754_f64");
        assert_eq!(out.metadata.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_zero_volatility_degrades_with_warning() {
        let assets = vec![asset("CASH", 100.0, 100.0, 0.0, 0.0)];
        let out = analyze_portfolio(&assets, &AssumptionSet::default()).unwrap();
        let r = &out.result;
        assert_eq!(r.performance.sharpe, 0.0);
        assert!(r.tail_risk.value_at_risk.is_none());
        assert!(r.drawdown.worst_path.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("volatility")));
        assert!((0.0..=100.0).contains(&r.health.score));
    }

    #[test]
    fn test_guardrail_weight_blends_into_health() {
        let assets = three_asset_portfolio();
        let mut with_blend = AssumptionSet::default();
        with_blend.guardrail_weight = 0.3;
        let mut without_blend = AssumptionSet::default();
        without_blend.guardrail_weight = 0.0;

        let a = analyze_portfolio(&assets, &with_blend).unwrap().result;
        let b = analyze_portfolio(&assets, &without_blend).unwrap().result;
        assert_eq!(b.health.score, b.composite.score.clamp(0.0, 100.0));
        let expected = a.composite.score * 0.7 + a.guardrails.score * 0.3;
        assert!((a.health.score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_factor_model_flows_through() {
        let mut assets = three_asset_portfolio();
        assets[0].factor_loadings = Some(vec![1.0, 0.1]);
        assets[0].residual_volatility = Some(0.03);
        assets[1].factor_loadings = Some(vec![0.05, -0.2]);
        assets[1].residual_volatility = Some(0.02);
        assets[2].factor_loadings = Some(vec![0.1, 0.6]);
        assets[2].residual_volatility = Some(0.10);

        let mut assumptions = AssumptionSet::default();
        assumptions.factor_names = vec!["Market".into(), "Real Assets".into()];
        assumptions.factor_covariance = vec![vec![0.0256, 0.002], vec![0.002, 0.0144]];

        let out = analyze_portfolio(&assets, &assumptions).unwrap().result;
        assert_eq!(out.factors.exposures.len(), 2);
        let r2 = out.factors.r_squared.unwrap();
        assert!((0.0..=1.0).contains(&r2));
    }
}

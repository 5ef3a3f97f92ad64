//! End-to-end checks over the whole pipeline: determinism, bounds and the
//! serialized output contract.

use portfolio_health_core::{analyze_portfolio, Asset, AssumptionSet, CorrelationTable};
use pretty_assertions::assert_eq;

fn asset(ticker: &str, target: f64, current: f64, vol: f64, beta: f64, expense: f64) -> Asset {
    Asset {
        ticker: ticker.to_string(),
        target_weight_pct: target,
        current_pct: current,
        volatility: vol,
        beta,
        expense_ratio: expense,
        expected_return_override: None,
        factor_loadings: None,
        residual_volatility: None,
        speculative: false,
    }
}

fn sample_portfolio() -> (Vec<Asset>, AssumptionSet) {
    let mut assets = vec![
        asset("VTI", 45.0, 48.0, 0.16, 1.0, 0.0003),
        asset("VXUS", 20.0, 18.0, 0.18, 0.9, 0.0007),
        asset("BND", 25.0, 22.0, 0.05, 0.1, 0.0003),
        asset("GLD", 7.0, 8.0, 0.14, 0.2, 0.004),
        asset("BTC", 3.0, 4.0, 0.65, 1.8, 0.0095),
    ];
    assets[4].speculative = true;
    assets[0].factor_loadings = Some(vec![1.0, 0.0]);
    assets[0].residual_volatility = Some(0.02);
    assets[1].factor_loadings = Some(vec![0.9, 0.1]);
    assets[1].residual_volatility = Some(0.06);
    assets[2].factor_loadings = Some(vec![0.05, -0.1]);
    assets[2].residual_volatility = Some(0.03);
    assets[3].factor_loadings = Some(vec![0.1, 0.8]);
    assets[3].residual_volatility = Some(0.08);

    let mut correlations = CorrelationTable::new();
    correlations.set("VTI", "VXUS", 0.85);
    correlations.set("VTI", "BND", -0.05);
    correlations.set("VTI", "GLD", 0.1);
    correlations.set("VTI", "BTC", 0.4);
    correlations.set("VXUS", "BND", 0.0);
    correlations.set("VXUS", "GLD", 0.12);
    correlations.set("BND", "GLD", 0.2);

    let assumptions = AssumptionSet {
        factor_names: vec!["Equity".into(), "Real Assets".into()],
        factor_covariance: vec![vec![0.0256, 0.003], vec![0.003, 0.0196]],
        correlations,
        ..AssumptionSet::default()
    };
    (assets, assumptions)
}

#[test]
fn identical_inputs_produce_identical_results() {
    let (assets, assumptions) = sample_portfolio();
    let a = analyze_portfolio(&assets, &assumptions).unwrap();
    let b = analyze_portfolio(&assets, &assumptions).unwrap();
    assert_eq!(
        serde_json::to_value(&a.result).unwrap(),
        serde_json::to_value(&b.result).unwrap()
    );
}

#[test]
fn all_scores_and_bounds_hold() {
    let (assets, assumptions) = sample_portfolio();
    let result = analyze_portfolio(&assets, &assumptions).unwrap().result;

    assert!((result.current_weights.values().sum::<f64>() - 1.0).abs() < 1e-12);
    assert!(result.risk.volatility > 0.0);
    assert!((0.0..=1.0).contains(&result.risk.diversification.index));
    assert!(result.drawdown.mean_max_drawdown <= 0.95);
    let var = result.tail_risk.value_at_risk.unwrap();
    let cvar = result.tail_risk.conditional_value_at_risk.unwrap();
    assert!(cvar >= var);
    let r2 = result.factors.r_squared.unwrap();
    assert!((0.0..=1.0).contains(&r2));
    assert!((0.0..=100.0).contains(&result.composite.score));
    assert!((0.0..=100.0).contains(&result.health.score));
}

#[test]
fn speculative_overweight_is_flagged() {
    let (assets, assumptions) = sample_portfolio();
    let result = analyze_portfolio(&assets, &assumptions).unwrap().result;

    // BTC drifted a full percentage point over a 3% target with a tight
    // speculative band: it must show up as at least a warning.
    let btc = result
        .guardrails
        .assets
        .iter()
        .find(|g| g.ticker == "BTC")
        .unwrap();
    assert!(btc.ratio > 0.5);
}

#[test]
fn result_serializes_with_stable_shape() {
    let (assets, assumptions) = sample_portfolio();
    let out = analyze_portfolio(&assets, &assumptions).unwrap();
    let json = serde_json::to_value(&out).unwrap();

    assert_eq!(json["metadata"]["precision"], "ieee754_f64");
    assert!(json["result"]["composite"]["pillars"].as_array().unwrap().len() == 4);
    assert!(json["result"]["guardrails"]["assets"].as_array().unwrap().len() == 5);
    assert!(json["result"]["health"]["penalty"] == 0.0);
}

#[test]
fn drifted_portfolio_scores_below_its_rebalanced_self() {
    let (assets, assumptions) = sample_portfolio();
    let drifted = analyze_portfolio(&assets, &assumptions).unwrap().result;

    let rebalanced: Vec<Asset> = assets
        .iter()
        .map(|a| {
            let mut a = a.clone();
            a.current_pct = a.target_weight_pct;
            a
        })
        .collect();
    let clean = analyze_portfolio(&rebalanced, &assumptions).unwrap().result;

    assert!((clean.guardrails.score - 100.0).abs() < 1e-9);
    assert!(drifted.guardrails.score < clean.guardrails.score);
    assert!(drifted.health.score <= clean.health.score + 1e-9 || drifted.composite.score > clean.composite.score);
}

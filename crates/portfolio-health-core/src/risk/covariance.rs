use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Asset, CorrelationTable};

/// Correlation-adjusted diversification measures.
///
/// Both formulations are computed and kept: the risk-contribution index is
/// the primary measure, the weight-only Herfindahl index is the fallback
/// used when portfolio variance is degenerate, and downstream consumers
/// read both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversificationIndexes {
    /// The selected index: risk-based when variance is well-defined,
    /// weight-based otherwise. In [0, 1]; 0 = fully concentrated.
    pub index: f64,
    /// Effective-risk-contributors index, `None` when variance is degenerate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_based: Option<f64>,
    /// Weight-only Herfindahl index.
    pub weight_based: f64,
}

/// Covariance-model risk metrics for one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskOutput {
    /// Annualised portfolio variance `wᵀΣw`.
    pub variance: f64,
    /// `sqrt(max(variance, 0))`.
    pub volatility: f64,
    /// Weighted average of per-asset betas.
    pub beta: f64,
    pub diversification: DiversificationIndexes,
    /// Each asset's fractional contribution to total variance; zeros when
    /// variance is degenerate.
    pub risk_contributions: Vec<f64>,
}

/// Build the asset covariance matrix `Σij = σi·σj·ρij`.
///
/// Non-finite or negative volatilities contribute zero rows/columns;
/// correlations come from the order-independent lookup (diagonal 1, missing
/// pairs 0, clamped to [-1, 1]).
pub fn build_covariance(assets: &[Asset], correlations: &CorrelationTable) -> Vec<Vec<f64>> {
    let sigmas: Vec<f64> = assets.iter().map(|a| sanitize_vol(a.volatility)).collect();
    let n = assets.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            let rho = correlations.get(&assets[i].ticker, &assets[j].ticker);
            matrix[i][j] = sigmas[i] * sigmas[j] * rho;
        }
    }
    matrix
}

fn sanitize_vol(vol: f64) -> f64 {
    if vol.is_finite() && vol > 0.0 {
        vol
    } else {
        0.0
    }
}

fn sanitize_beta(beta: f64) -> f64 {
    if beta.is_finite() {
        beta
    } else {
        1.0
    }
}

/// Compute variance, volatility, beta and diversification for normalised
/// weights.
///
/// Weights are looked up by ticker; assets missing from the map carry
/// weight 0.
pub fn portfolio_risk(
    assets: &[Asset],
    weights: &BTreeMap<String, f64>,
    correlations: &CorrelationTable,
) -> RiskOutput {
    let n = assets.len();
    let w: Vec<f64> = assets
        .iter()
        .map(|a| {
            let v = weights.get(&a.ticker).copied().unwrap_or(0.0);
            if v.is_finite() {
                v.max(0.0)
            } else {
                0.0
            }
        })
        .collect();

    let sigma = build_covariance(assets, correlations);

    // Σw, then variance = wᵀ(Σw).
    let sigma_w: Vec<f64> = (0..n)
        .map(|i| (0..n).map(|j| sigma[i][j] * w[j]).sum())
        .collect();
    let variance: f64 = (0..n).map(|i| w[i] * sigma_w[i]).sum();
    let volatility = variance.max(0.0).sqrt();

    let beta: f64 = assets
        .iter()
        .zip(&w)
        .map(|(a, wi)| wi * sanitize_beta(a.beta))
        .sum();

    let (risk_contributions, risk_based) = risk_contribution_index(&w, &sigma_w, variance, n);
    let weight_based = weight_herfindahl_index(&w, n);
    let index = risk_based.unwrap_or(weight_based);

    RiskOutput {
        variance,
        volatility,
        beta,
        diversification: DiversificationIndexes {
            index,
            risk_based,
            weight_based,
        },
        risk_contributions,
    }
}

/// Effective-risk-contributors index: Herfindahl of the per-asset variance
/// contributions, inverted to an effective count, rescaled to [0, 1].
fn risk_contribution_index(
    w: &[f64],
    sigma_w: &[f64],
    variance: f64,
    n: usize,
) -> (Vec<f64>, Option<f64>) {
    if n == 0 || !(variance > 0.0) || !variance.is_finite() {
        return (vec![0.0; n], None);
    }
    let contributions: Vec<f64> = w
        .iter()
        .zip(sigma_w)
        .map(|(wi, swi)| wi * swi / variance)
        .collect();
    if n == 1 {
        return (contributions, Some(0.0));
    }
    let hhi: f64 = contributions.iter().map(|c| c * c).sum();
    if hhi <= 0.0 {
        return (contributions, None);
    }
    let effective = 1.0 / hhi;
    let index = ((effective - 1.0) / (n as f64 - 1.0)).clamp(0.0, 1.0);
    (contributions, Some(index))
}

/// Weight-only fallback: `(1 − HHI(w)) / (1 − 1/n)`.
fn weight_herfindahl_index(w: &[f64], n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let total: f64 = w.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let hhi: f64 = w.iter().map(|wi| (wi / total) * (wi / total)).sum();
    ((1.0 - hhi) / (1.0 - 1.0 / n as f64)).clamp(0.0, 1.0)
}

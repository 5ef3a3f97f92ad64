use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Asset, GuardrailPolicy};

/// Drift-ratio tiers: (upper ratio bound, score). Ratios above the last
/// bound score 0.
const RATIO_SCORE_TIERS: [(f64, f64); 4] = [(0.5, 100.0), (1.0, 80.0), (1.5, 60.0), (2.0, 40.0)];

/// Band classification of one holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldingClass {
    /// High-volatility or small position: tightest band.
    Tight,
    /// Mid-sized holding: intermediate band.
    Satellite,
    /// Large anchor holding: widest band, with an absolute floor.
    Core,
}

/// Per-asset drift assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetGuardrail {
    pub ticker: String,
    pub class: HoldingClass,
    /// Target allocation as a fraction of portfolio value.
    pub target_weight: f64,
    /// Current allocation as a fraction of portfolio value.
    pub current_weight: f64,
    /// Allowed drift tolerance around the target, in weight fraction.
    pub band: f64,
    /// |current - target|
    pub drift: f64,
    /// drift / band; infinite when the band is zero but drift is not.
    pub ratio: f64,
    /// Tiered 0–100 score for this asset's drift.
    pub score: f64,
}

/// Full guardrail assessment for a portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailOutput {
    pub assets: Vec<AssetGuardrail>,
    /// Target-weight-fraction weighted average of the per-asset scores.
    pub score: f64,
    /// Tickers with drift ratio > 1.
    pub breaches: Vec<String>,
    /// Tickers with drift ratio in (0.5, 1].
    pub warnings: Vec<String>,
    /// Speculative tickers whose absolute drift exceeds the policy cap.
    pub cap_breaches: Vec<String>,
}

/// Tolerance band for one asset given its target weight and classification.
fn tolerance_band(asset: &Asset, target_weight: f64, policy: &GuardrailPolicy) -> (f64, HoldingClass) {
    let class = if asset.volatility > policy.high_volatility_threshold
        || target_weight < policy.small_position_threshold
    {
        HoldingClass::Tight
    } else if target_weight >= policy.core_threshold {
        HoldingClass::Core
    } else {
        HoldingClass::Satellite
    };

    let band = match class {
        HoldingClass::Tight => policy.tight_fraction * target_weight,
        HoldingClass::Satellite => policy.satellite_fraction * target_weight,
        HoldingClass::Core => (policy.core_fraction * target_weight).max(policy.core_floor),
    };

    // Crypto-like holdings never earn a band wider than the absolute cap.
    let band = if asset.speculative {
        band.min(policy.speculative_cap)
    } else {
        band
    };

    (band.max(0.0), class)
}

/// Convert a drift ratio to its tiered 0–100 score.
fn ratio_score(ratio: f64) -> f64 {
    for (bound, score) in RATIO_SCORE_TIERS {
        if ratio <= bound {
            return score;
        }
    }
    0.0
}

/// Assess per-asset drift against asset-class tolerance bands.
///
/// `target` and `current` are normalised weight maps keyed by ticker; assets
/// missing from either map are treated as weight 0 there.
pub fn assess_guardrails(
    assets: &[Asset],
    target: &BTreeMap<String, f64>,
    current: &BTreeMap<String, f64>,
    policy: &GuardrailPolicy,
) -> GuardrailOutput {
    let mut rows = Vec::with_capacity(assets.len());
    let mut breaches = Vec::new();
    let mut warnings = Vec::new();
    let mut cap_breaches = Vec::new();

    let mut weighted_score = 0.0;
    let mut weight_total = 0.0;

    for asset in assets {
        let target_weight = target.get(&asset.ticker).copied().unwrap_or(0.0);
        let current_weight = current.get(&asset.ticker).copied().unwrap_or(0.0);
        let drift = (current_weight - target_weight).abs();

        let (band, class) = tolerance_band(asset, target_weight, policy);
        let ratio = if band > 0.0 {
            drift / band
        } else if drift > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        let score = ratio_score(ratio);

        if ratio > 1.0 {
            breaches.push(asset.ticker.clone());
        } else if ratio > 0.5 {
            warnings.push(asset.ticker.clone());
        }
        if asset.speculative && drift > policy.speculative_cap {
            cap_breaches.push(asset.ticker.clone());
        }

        weighted_score += target_weight * score;
        weight_total += target_weight;

        rows.push(AssetGuardrail {
            ticker: asset.ticker.clone(),
            class,
            target_weight,
            current_weight,
            band,
            drift,
            ratio,
            score,
        });
    }

    let score = if weight_total > 0.0 {
        weighted_score / weight_total
    } else if rows.is_empty() {
        100.0
    } else {
        rows.iter().map(|r| r.score).sum::<f64>() / rows.len() as f64
    };

    GuardrailOutput {
        assets: rows,
        score,
        breaches,
        warnings,
        cap_breaches,
    }
}

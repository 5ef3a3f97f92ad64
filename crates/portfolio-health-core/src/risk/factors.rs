use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PortfolioHealthError;
use crate::types::Asset;
use crate::HealthResult;

/// Symmetry tolerance for the factor covariance matrix.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Portfolio-level exposure to one factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorExposure {
    pub name: String,
    /// Weighted sum of per-asset loadings.
    pub exposure: f64,
}

/// Output of the multi-factor variance decomposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorOutput {
    pub exposures: Vec<FactorExposure>,
    /// `eᵀFe` over the factor covariance matrix.
    pub explained_variance: f64,
    /// `Σ wi²·residualVoli²`.
    pub residual_variance: f64,
    /// max(explained + residual, directly computed portfolio variance).
    pub total_variance: f64,
    /// explained / total, clamped to [0, 1]; `None` when total is 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<f64>,
}

fn validate_factor_model(
    assets: &[Asset],
    factor_names: &[String],
    factor_covariance: &[Vec<f64>],
) -> HealthResult<()> {
    let k = factor_names.len();
    if factor_covariance.len() != k {
        return Err(PortfolioHealthError::InvalidInput {
            field: "factor_covariance".into(),
            reason: format!(
                "Matrix has {} rows but {} factors are named",
                factor_covariance.len(),
                k
            ),
        });
    }
    for (i, row) in factor_covariance.iter().enumerate() {
        if row.len() != k {
            return Err(PortfolioHealthError::InvalidInput {
                field: "factor_covariance".into(),
                reason: format!("Row {} has {} columns, expected {}", i, row.len(), k),
            });
        }
    }
    for i in 0..k {
        for j in (i + 1)..k {
            if (factor_covariance[i][j] - factor_covariance[j][i]).abs() > SYMMETRY_TOLERANCE {
                return Err(PortfolioHealthError::InvalidInput {
                    field: "factor_covariance".into(),
                    reason: format!("Matrix is not symmetric at ({i}, {j})"),
                });
            }
        }
    }
    for asset in assets {
        if let Some(loadings) = &asset.factor_loadings {
            if loadings.len() != k {
                return Err(PortfolioHealthError::InvalidInput {
                    field: format!("factor_loadings[{}]", asset.ticker),
                    reason: format!("{} loadings supplied, expected {}", loadings.len(), k),
                });
            }
        }
    }
    Ok(())
}

/// Project normalised weights onto the factor model.
///
/// Assets without a loading vector contribute zero exposure; assets without
/// a residual volatility contribute zero residual variance.
/// `portfolio_variance` is the directly computed `wᵀΣw` used as a floor for
/// the total-variance denominator.
pub fn decompose_factors(
    assets: &[Asset],
    weights: &BTreeMap<String, f64>,
    factor_names: &[String],
    factor_covariance: &[Vec<f64>],
    portfolio_variance: f64,
) -> HealthResult<FactorOutput> {
    validate_factor_model(assets, factor_names, factor_covariance)?;
    let k = factor_names.len();

    let mut exposure = vec![0.0; k];
    let mut residual_variance = 0.0;

    for asset in assets {
        let w = weights.get(&asset.ticker).copied().unwrap_or(0.0);
        if !(w.is_finite() && w > 0.0) {
            continue;
        }
        if let Some(loadings) = &asset.factor_loadings {
            for (e, loading) in exposure.iter_mut().zip(loadings) {
                if loading.is_finite() {
                    *e += w * loading;
                }
            }
        }
        if let Some(rv) = asset.residual_volatility {
            if rv.is_finite() && rv > 0.0 {
                residual_variance += w * w * rv * rv;
            }
        }
    }

    // eᵀFe
    let mut explained_variance = 0.0;
    for i in 0..k {
        for j in 0..k {
            explained_variance += exposure[i] * factor_covariance[i][j] * exposure[j];
        }
    }
    let explained_variance = explained_variance.max(0.0);

    let model_variance = explained_variance + residual_variance;
    let direct = if portfolio_variance.is_finite() {
        portfolio_variance.max(0.0)
    } else {
        0.0
    };
    let total_variance = model_variance.max(direct);

    let r_squared = if total_variance > 0.0 {
        Some((explained_variance / total_variance).clamp(0.0, 1.0))
    } else {
        None
    };

    Ok(FactorOutput {
        exposures: factor_names
            .iter()
            .zip(exposure)
            .map(|(name, exposure)| FactorExposure {
                name: name.clone(),
                exposure,
            })
            .collect(),
        explained_variance,
        residual_variance,
        total_variance,
        r_squared,
    })
}

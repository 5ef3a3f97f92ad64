use serde::{Deserialize, Serialize};

use super::metrics::{metric_definitions, MetricInputs, Pillar};

/// Scored (or unscoreable) state of one metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricScore {
    pub name: String,
    pub pillar: Pillar,
    /// Raw value handed to the curve; `None` when unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<f64>,
    /// Curve output; `None` when the raw value was unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Intra-pillar weight.
    pub weight: f64,
}

/// Weight-normalised aggregate of one pillar's metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarScore {
    pub pillar: Pillar,
    /// `None` when no member metric could be scored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Fraction of the pillar's metric weight that was scoreable.
    pub coverage: f64,
}

/// Composite scoring output: per-metric scores, per-pillar aggregates and
/// the overall 0–100 score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeOutput {
    /// Pillar-weighted overall score in [0, 100].
    pub score: f64,
    pub pillars: Vec<PillarScore>,
    pub metrics: Vec<MetricScore>,
    /// Names of metrics that could not be scored.
    pub unscored: Vec<String>,
}

/// Score every metric in the table and aggregate into pillar and composite
/// scores.
///
/// Metrics with missing or non-finite raw values drop out of both the
/// numerator and denominator of their pillar average; a pillar with no
/// scoreable metric drops out of the composite the same way.
pub fn composite_score(inputs: &MetricInputs) -> CompositeOutput {
    let mut metrics = Vec::new();
    let mut unscored = Vec::new();

    for def in metric_definitions() {
        let raw_value = (def.accessor)(inputs).filter(|v| v.is_finite());
        let score = raw_value.map(|v| def.curve.score(v));
        if score.is_none() {
            unscored.push(def.name.to_string());
        }
        metrics.push(MetricScore {
            name: def.name.to_string(),
            pillar: def.pillar,
            raw_value,
            score,
            weight: def.weight,
        });
    }

    let mut pillars = Vec::with_capacity(Pillar::ALL.len());
    for pillar in Pillar::ALL {
        let members: Vec<&MetricScore> = metrics.iter().filter(|m| m.pillar == pillar).collect();
        let total_weight: f64 = members.iter().map(|m| m.weight).sum();
        let scored_weight: f64 = members
            .iter()
            .filter(|m| m.score.is_some())
            .map(|m| m.weight)
            .sum();
        let score = if scored_weight > 0.0 {
            let weighted: f64 = members
                .iter()
                .filter_map(|m| m.score.map(|s| m.weight * s))
                .sum();
            Some((weighted / scored_weight).clamp(0.0, 100.0))
        } else {
            None
        };
        let coverage = if total_weight > 0.0 {
            scored_weight / total_weight
        } else {
            0.0
        };
        pillars.push(PillarScore {
            pillar,
            score,
            coverage,
        });
    }

    let scored_pillar_weight: f64 = pillars
        .iter()
        .filter(|p| p.score.is_some())
        .map(|p| p.pillar.weight())
        .sum();
    let score = if scored_pillar_weight > 0.0 {
        let weighted: f64 = pillars
            .iter()
            .filter_map(|p| p.score.map(|s| p.pillar.weight() * s))
            .sum();
        (weighted / scored_pillar_weight).clamp(0.0, 100.0)
    } else {
        0.0
    };

    CompositeOutput {
        score,
        pillars,
        metrics,
        unscored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_inputs() -> MetricInputs {
        MetricInputs {
            sharpe: 1.2,
            sortino: 1.8,
            alpha: 0.005,
            calmar: 0.6,
            volatility: 0.13,
            beta: 0.95,
            expense_ratio: 0.002,
            diversification_index: 0.75,
            max_drawdown: Some(0.22),
            cvar: Some(0.045),
            down_capture: Some(0.85),
            r_squared: Some(0.88),
        }
    }

    #[test]
    fn test_score_within_bounds() {
        let out = composite_score(&healthy_inputs());
        assert!(out.score >= 0.0 && out.score <= 100.0);
        for pillar in &out.pillars {
            if let Some(s) = pillar.score {
                assert!((0.0..=100.0).contains(&s));
            }
        }
    }

    #[test]
    fn test_full_inputs_full_coverage() {
        let out = composite_score(&healthy_inputs());
        assert!(out.unscored.is_empty());
        for pillar in &out.pillars {
            assert!((pillar.coverage - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_missing_metrics_excluded_not_zeroed() {
        let mut inputs = healthy_inputs();
        inputs.cvar = None;
        inputs.max_drawdown = None;
        let full = composite_score(&healthy_inputs());
        let partial = composite_score(&inputs);

        assert!(partial.unscored.contains(&"cvar_monthly".to_string()));
        assert!(partial.unscored.contains(&"max_drawdown".to_string()));

        let risk = partial
            .pillars
            .iter()
            .find(|p| p.pillar == Pillar::Risk)
            .unwrap();
        assert!((risk.coverage - 0.5).abs() < 1e-9);
        // The risk pillar still scores from its remaining members instead
        // of collapsing toward 0.
        assert!(risk.score.unwrap() > 40.0);

        // Performance/structure/cost pillars are untouched.
        for p in [Pillar::Performance, Pillar::Cost] {
            let a = full.pillars.iter().find(|x| x.pillar == p).unwrap();
            let b = partial.pillars.iter().find(|x| x.pillar == p).unwrap();
            assert_eq!(a.score.unwrap().to_bits(), b.score.unwrap().to_bits());
        }
    }

    #[test]
    fn test_whole_pillar_unscoreable_drops_out() {
        let mut inputs = healthy_inputs();
        inputs.max_drawdown = None;
        inputs.cvar = None;
        inputs.volatility = f64::NAN;
        inputs.beta = f64::NAN;
        let out = composite_score(&inputs);
        let risk = out.pillars.iter().find(|p| p.pillar == Pillar::Risk).unwrap();
        assert!(risk.score.is_none());
        assert_eq!(risk.coverage, 0.0);
        // Composite renormalises over the remaining 0.7 pillar weight.
        assert!(out.score > 0.0 && out.score <= 100.0);
    }

    #[test]
    fn test_terrible_portfolio_scores_low() {
        let inputs = MetricInputs {
            sharpe: -0.6,
            sortino: -0.8,
            alpha: -0.05,
            calmar: 0.0,
            volatility: 0.45,
            beta: 2.2,
            expense_ratio: 0.02,
            diversification_index: 0.0,
            max_drawdown: Some(0.7),
            cvar: Some(0.15),
            down_capture: Some(1.6),
            r_squared: Some(0.1),
        };
        let out = composite_score(&inputs);
        assert!(out.score < 15.0);
    }
}

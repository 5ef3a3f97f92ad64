use serde::{Deserialize, Serialize};

use crate::allocation::guardrails::GuardrailOutput;
use crate::scoring::composite::CompositeOutput;

/// Upper bound on the guardrail blend weight.
const MAX_GUARDRAIL_WEIGHT: f64 = 0.3;

const HEALTHY_THRESHOLD: f64 = 75.0;
const WATCH_THRESHOLD: f64 = 50.0;

/// Traffic-light status for the overall portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Watch,
    Critical,
}

impl HealthStatus {
    fn from_score(score: f64) -> Self {
        if score >= HEALTHY_THRESHOLD {
            HealthStatus::Healthy
        } else if score >= WATCH_THRESHOLD {
            HealthStatus::Watch
        } else {
            HealthStatus::Critical
        }
    }

    fn downgraded(self) -> Self {
        match self {
            HealthStatus::Healthy => HealthStatus::Watch,
            _ => HealthStatus::Critical,
        }
    }
}

/// Final blended health score and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSummary {
    /// `composite · (1 − g) + guardrail · g`, in [0, 100].
    pub score: f64,
    /// Guardrail blend weight actually applied (clamped to [0, 0.3]).
    pub guardrail_weight: f64,
    pub status: HealthStatus,
    /// Legacy direct score deduction. Always 0: earlier revisions
    /// subtracted a guardrail penalty from the health score outright, and
    /// the field survives for consumers that still read it. The guardrail
    /// influence that actually executes is the weight blend above.
    pub penalty: f64,
}

/// Blend the composite pillar score with the guardrail score and map the
/// result to a status label. Any guardrail breach downgrades the label one
/// step.
pub fn blend_health(
    composite: &CompositeOutput,
    guardrails: &GuardrailOutput,
    guardrail_weight: f64,
) -> HealthSummary {
    let g = if guardrail_weight.is_finite() {
        guardrail_weight.clamp(0.0, MAX_GUARDRAIL_WEIGHT)
    } else {
        0.0
    };
    let score = (composite.score * (1.0 - g) + guardrails.score * g).clamp(0.0, 100.0);

    let mut status = HealthStatus::from_score(score);
    if !guardrails.breaches.is_empty() || !guardrails.cap_breaches.is_empty() {
        status = status.downgraded();
    }

    HealthSummary {
        score,
        guardrail_weight: g,
        status,
        penalty: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::composite::composite_score;
    use crate::scoring::metrics::MetricInputs;

    fn composite_with_score(target: f64) -> CompositeOutput {
        let mut out = composite_score(&MetricInputs::default());
        out.score = target;
        out
    }

    fn guardrails_with(score: f64, breaches: Vec<String>) -> GuardrailOutput {
        GuardrailOutput {
            assets: Vec::new(),
            score,
            breaches,
            warnings: Vec::new(),
            cap_breaches: Vec::new(),
        }
    }

    #[test]
    fn test_blend_is_linear() {
        let summary = blend_health(
            &composite_with_score(80.0),
            &guardrails_with(40.0, Vec::new()),
            0.2,
        );
        assert!((summary.score - (80.0 * 0.8 + 40.0 * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weight_leaves_composite_unchanged() {
        let summary = blend_health(
            &composite_with_score(63.0),
            &guardrails_with(0.0, Vec::new()),
            0.0,
        );
        assert_eq!(summary.score, 63.0);
        assert_eq!(summary.status, HealthStatus::Watch);
    }

    #[test]
    fn test_weight_clamped_to_cap() {
        let summary = blend_health(
            &composite_with_score(100.0),
            &guardrails_with(0.0, Vec::new()),
            0.9,
        );
        assert_eq!(summary.guardrail_weight, 0.3);
        assert!((summary.score - 70.0).abs() < 1e-12);
    }

    #[test]
    fn test_breach_downgrades_status() {
        let summary = blend_health(
            &composite_with_score(90.0),
            &guardrails_with(90.0, vec!["GLD".into()]),
            0.1,
        );
        assert_eq!(summary.status, HealthStatus::Watch);

        let summary = blend_health(
            &composite_with_score(60.0),
            &guardrails_with(60.0, vec!["GLD".into()]),
            0.1,
        );
        assert_eq!(summary.status, HealthStatus::Critical);
    }

    #[test]
    fn test_penalty_is_always_zero() {
        let summary = blend_health(
            &composite_with_score(50.0),
            &guardrails_with(10.0, vec!["X".into()]),
            0.3,
        );
        assert_eq!(summary.penalty, 0.0);
    }

    #[test]
    fn test_score_bounded() {
        for composite in [0.0, 37.5, 100.0] {
            for guard in [0.0, 55.0, 100.0] {
                for g in [0.0, 0.15, 0.3, 2.0] {
                    let s = blend_health(
                        &composite_with_score(composite),
                        &guardrails_with(guard, Vec::new()),
                        g,
                    );
                    assert!((0.0..=100.0).contains(&s.score));
                }
            }
        }
    }
}

use serde::{Deserialize, Serialize};

use super::curves::ScoreCurve;

/// Top-level scoring category with its fixed weight in the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pillar {
    Performance,
    Risk,
    Structure,
    Cost,
}

impl Pillar {
    pub const ALL: [Pillar; 4] = [Pillar::Performance, Pillar::Risk, Pillar::Structure, Pillar::Cost];

    /// Fixed pillar weight in the composite score.
    pub fn weight(&self) -> f64 {
        match self {
            Pillar::Performance => 0.40,
            Pillar::Risk => 0.30,
            Pillar::Structure => 0.20,
            Pillar::Cost => 0.10,
        }
    }
}

/// Raw metric values the scoring engine reads. `None` marks a metric the
/// upstream models could not compute; such metrics are excluded from
/// aggregation rather than scored as 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricInputs {
    pub sharpe: f64,
    pub sortino: f64,
    pub alpha: f64,
    pub calmar: f64,
    pub volatility: f64,
    pub beta: f64,
    pub expense_ratio: f64,
    pub diversification_index: f64,
    pub max_drawdown: Option<f64>,
    pub cvar: Option<f64>,
    pub down_capture: Option<f64>,
    pub r_squared: Option<f64>,
}

/// One scoreable metric: pillar membership, intra-pillar weight, curve and
/// the accessor pulling its raw value out of [`MetricInputs`].
pub struct MetricDefinition {
    pub name: &'static str,
    pub pillar: Pillar,
    pub weight: f64,
    pub curve: ScoreCurve,
    pub accessor: fn(&MetricInputs) -> Option<f64>,
}

fn anchors(points: &[(f64, f64)]) -> ScoreCurve {
    ScoreCurve::Anchors(points.to_vec())
}

/// The full metric table. Curve calibration lives here and nowhere else.
pub fn metric_definitions() -> Vec<MetricDefinition> {
    vec![
        // -- Performance --
        MetricDefinition {
            name: "sharpe_ratio",
            pillar: Pillar::Performance,
            weight: 0.35,
            curve: anchors(&[
                (-0.5, 0.0),
                (0.0, 20.0),
                (0.5, 45.0),
                (1.0, 70.0),
                (1.5, 85.0),
                (2.0, 95.0),
                (3.0, 100.0),
            ]),
            accessor: |m| Some(m.sharpe),
        },
        MetricDefinition {
            name: "sortino_ratio",
            pillar: Pillar::Performance,
            weight: 0.25,
            curve: anchors(&[
                (-0.5, 0.0),
                (0.0, 20.0),
                (0.75, 50.0),
                (1.5, 75.0),
                (2.5, 90.0),
                (4.0, 100.0),
            ]),
            accessor: |m| Some(m.sortino),
        },
        MetricDefinition {
            name: "alpha",
            pillar: Pillar::Performance,
            weight: 0.20,
            curve: anchors(&[
                (-0.03, 0.0),
                (-0.01, 30.0),
                (0.0, 60.0),
                (0.01, 80.0),
                (0.03, 100.0),
            ]),
            accessor: |m| Some(m.alpha),
        },
        MetricDefinition {
            name: "calmar_ratio",
            pillar: Pillar::Performance,
            weight: 0.20,
            curve: anchors(&[
                (0.0, 0.0),
                (0.25, 40.0),
                (0.5, 65.0),
                (1.0, 85.0),
                (2.0, 100.0),
            ]),
            accessor: |m| Some(m.calmar),
        },
        // -- Risk --
        MetricDefinition {
            name: "volatility",
            pillar: Pillar::Risk,
            weight: 0.30,
            curve: anchors(&[
                (0.05, 100.0),
                (0.10, 90.0),
                (0.15, 75.0),
                (0.20, 55.0),
                (0.30, 25.0),
                (0.40, 0.0),
            ]),
            accessor: |m| Some(m.volatility),
        },
        MetricDefinition {
            name: "max_drawdown",
            pillar: Pillar::Risk,
            weight: 0.25,
            curve: anchors(&[
                (0.05, 100.0),
                (0.15, 85.0),
                (0.25, 65.0),
                (0.40, 35.0),
                (0.60, 0.0),
            ]),
            accessor: |m| m.max_drawdown,
        },
        MetricDefinition {
            name: "cvar_monthly",
            pillar: Pillar::Risk,
            weight: 0.25,
            curve: anchors(&[
                (0.02, 100.0),
                (0.04, 85.0),
                (0.06, 65.0),
                (0.09, 35.0),
                (0.12, 0.0),
            ]),
            accessor: |m| m.cvar,
        },
        MetricDefinition {
            name: "beta",
            pillar: Pillar::Risk,
            weight: 0.20,
            curve: ScoreCurve::TargetBand {
                target: 1.0,
                band: 0.6,
                exponent: 2.0,
            },
            accessor: |m| Some(m.beta),
        },
        // -- Structure --
        MetricDefinition {
            name: "diversification",
            pillar: Pillar::Structure,
            weight: 0.40,
            curve: anchors(&[
                (0.0, 10.0),
                (0.3, 45.0),
                (0.5, 65.0),
                (0.7, 85.0),
                (0.9, 100.0),
            ]),
            accessor: |m| Some(m.diversification_index),
        },
        MetricDefinition {
            name: "factor_r_squared",
            pillar: Pillar::Structure,
            weight: 0.30,
            curve: ScoreCurve::TargetBand {
                target: 0.85,
                band: 0.5,
                exponent: 1.5,
            },
            accessor: |m| m.r_squared,
        },
        MetricDefinition {
            name: "down_capture",
            pillar: Pillar::Structure,
            weight: 0.30,
            curve: anchors(&[
                (0.5, 100.0),
                (0.8, 85.0),
                (1.0, 65.0),
                (1.2, 30.0),
                (1.5, 0.0),
            ]),
            accessor: |m| m.down_capture,
        },
        // -- Cost --
        MetricDefinition {
            name: "expense_ratio",
            pillar: Pillar::Cost,
            weight: 1.0,
            curve: anchors(&[
                (0.0, 100.0),
                (0.001, 95.0),
                (0.003, 80.0),
                (0.006, 55.0),
                (0.010, 30.0),
                (0.015, 0.0),
            ]),
            accessor: |m| Some(m.expense_ratio),
        },
    ]
}

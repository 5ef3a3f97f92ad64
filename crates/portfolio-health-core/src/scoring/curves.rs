use serde::{Deserialize, Serialize};

/// A configurable raw-value → 0–100 scoring curve.
///
/// Curves are data, not code: recalibrating a metric means editing its
/// control points or band parameters, never a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScoreCurve {
    /// Piecewise-linear interpolation over (raw value, score) control
    /// points sorted by raw value; clamped to the end scores outside the
    /// covered range.
    Anchors(Vec<(f64, f64)>),
    /// Symmetric band around an ideal value:
    /// `100 · max(0, 1 − (|value − target| / band)^exponent)`.
    TargetBand {
        target: f64,
        band: f64,
        exponent: f64,
    },
}

impl ScoreCurve {
    /// Evaluate the curve, clamped to [0, 100]. Non-finite values score 0.
    pub fn score(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        let raw = match self {
            ScoreCurve::Anchors(points) => score_anchors(points, value),
            ScoreCurve::TargetBand {
                target,
                band,
                exponent,
            } => score_target_band(value, *target, *band, *exponent),
        };
        raw.clamp(0.0, 100.0)
    }
}

fn score_anchors(points: &[(f64, f64)], value: f64) -> f64 {
    let Some(first) = points.first() else {
        return 0.0;
    };
    if value <= first.0 {
        return first.1;
    }
    let last = points[points.len() - 1];
    if value >= last.0 {
        return last.1;
    }
    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if value <= x1 {
            let dx = x1 - x0;
            if dx <= 0.0 {
                return y1;
            }
            let t = (value - x0) / dx;
            return y0 + t * (y1 - y0);
        }
    }
    last.1
}

fn score_target_band(value: f64, target: f64, band: f64, exponent: f64) -> f64 {
    let distance = (value - target).abs();
    if band <= 0.0 {
        return if distance == 0.0 { 100.0 } else { 0.0 };
    }
    100.0 * (1.0 - (distance / band).powf(exponent.max(0.0))).max(0.0)
}

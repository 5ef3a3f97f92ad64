use std::collections::BTreeMap;

/// Normalise a map of raw non-negative values (weights, percentages or
/// dollar amounts) into fractional weights.
///
/// Negative and non-finite entries are clamped to 0 before summing. When the
/// clamped total is not positive, every asset receives an equal weight so
/// downstream maths never divides by zero. An empty map stays empty.
pub fn normalize_weights(raw: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    if raw.is_empty() {
        return BTreeMap::new();
    }

    let clamped: BTreeMap<&str, f64> = raw
        .iter()
        .map(|(k, v)| {
            let v = if v.is_finite() { v.max(0.0) } else { 0.0 };
            (k.as_str(), v)
        })
        .collect();

    let total: f64 = clamped.values().sum();

    if total <= 0.0 {
        let equal = 1.0 / raw.len() as f64;
        return raw.keys().map(|k| (k.clone(), equal)).collect();
    }

    clamped
        .into_iter()
        .map(|(k, v)| (k.to_string(), v / total))
        .collect()
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = f64;

/// One holding in the portfolio snapshot.
///
/// Percent-valued fields (`target_weight_pct`, `current_pct`) are in
/// display units (0–100); everything else is a decimal rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Ticker symbol; unique key within a portfolio.
    pub ticker: String,
    /// Target allocation in percent of portfolio value (>= 0).
    pub target_weight_pct: f64,
    /// Current allocation in percent of portfolio value.
    pub current_pct: f64,
    /// Annualised return volatility (> 0 for a simulated asset).
    pub volatility: Rate,
    /// Market beta versus the benchmark.
    pub beta: f64,
    /// Annual expense ratio as a decimal (0.0015 = 15 bps).
    pub expense_ratio: Rate,
    /// Overrides the CAPM expected return when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_return_override: Option<Rate>,
    /// Loadings onto `AssumptionSet::factor_names`, same order and length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor_loadings: Option<Vec<f64>>,
    /// Idiosyncratic (residual) annualised volatility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual_volatility: Option<Rate>,
    /// Marks crypto-like holdings subject to the absolute guardrail cap.
    #[serde(default)]
    pub speculative: bool,
}

/// Order-independent asset-pair correlation lookup.
///
/// Keys are stored with the lexically smaller ticker first, so
/// `set("B", "A", ..)` and `get("A", "B")` address the same entry.
/// Serialized as a flat entry list, since JSON maps cannot key on pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CorrelationEntry>", into = "Vec<CorrelationEntry>")]
pub struct CorrelationTable {
    pairs: BTreeMap<(String, String), f64>,
}

/// Wire form of one [`CorrelationTable`] entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationEntry {
    pub a: String,
    pub b: String,
    pub rho: f64,
}

impl From<Vec<CorrelationEntry>> for CorrelationTable {
    fn from(entries: Vec<CorrelationEntry>) -> Self {
        let mut table = CorrelationTable::new();
        for e in entries {
            table.set(&e.a, &e.b, e.rho);
        }
        table
    }
}

impl From<CorrelationTable> for Vec<CorrelationEntry> {
    fn from(table: CorrelationTable) -> Self {
        table
            .pairs
            .into_iter()
            .map(|((a, b), rho)| CorrelationEntry { a, b, rho })
            .collect()
    }
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn set(&mut self, a: &str, b: &str, rho: f64) {
        self.pairs.insert(Self::key(a, b), rho);
    }

    /// Pairwise correlation: 1 on the diagonal, 0 for unknown pairs,
    /// clamped to [-1, 1] otherwise.
    pub fn get(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        match self.pairs.get(&Self::key(a, b)) {
            Some(rho) if rho.is_finite() => rho.clamp(-1.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Tolerance-band parameters for the guardrail assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailPolicy {
    /// Volatility above which an asset gets the tight band.
    pub high_volatility_threshold: Rate,
    /// Target weight below which an asset gets the tight band.
    pub small_position_threshold: f64,
    /// Target weight at or above which an asset is a core holding.
    pub core_threshold: f64,
    /// Band as a fraction of target weight for tight-band assets.
    pub tight_fraction: f64,
    /// Band fraction for satellite holdings.
    pub satellite_fraction: f64,
    /// Band fraction for core holdings.
    pub core_fraction: f64,
    /// Absolute band floor for core holdings.
    pub core_floor: f64,
    /// Absolute band cap for speculative holdings.
    pub speculative_cap: f64,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self {
            high_volatility_threshold: 0.40,
            small_position_threshold: 0.05,
            core_threshold: 0.20,
            tight_fraction: 0.15,
            satellite_fraction: 0.25,
            core_fraction: 0.20,
            core_floor: 0.05,
            speculative_cap: 0.02,
        }
    }
}

/// Market assumptions and engine parameters for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssumptionSet {
    /// Annualised risk-free rate.
    pub risk_free_rate: Rate,
    /// Annualised benchmark expected return.
    pub benchmark_return: Rate,
    /// Annualised benchmark volatility.
    pub benchmark_volatility: Rate,
    /// Factor model dimension names (e.g. "Market", "Value", "Momentum").
    #[serde(default)]
    pub factor_names: Vec<String>,
    /// Factor covariance matrix, side = `factor_names.len()`.
    #[serde(default)]
    pub factor_covariance: Vec<Vec<f64>>,
    /// Pairwise asset correlations; missing pairs default to 0.
    #[serde(default)]
    pub correlations: CorrelationTable,
    /// Blend weight of the guardrail score in the final health score,
    /// clamped to [0, 0.3] at use.
    pub guardrail_weight: f64,
    #[serde(default)]
    pub guardrail_policy: GuardrailPolicy,
    /// VaR/CVaR confidence level. Defaults to 0.95.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

fn default_confidence_level() -> f64 {
    0.95
}

impl Default for AssumptionSet {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.04,
            benchmark_return: 0.08,
            benchmark_volatility: 0.16,
            factor_names: Vec::new(),
            factor_covariance: Vec::new(),
            correlations: CorrelationTable::new(),
            guardrail_weight: 0.15,
            guardrail_policy: GuardrailPolicy::default(),
            confidence_level: 0.95,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}

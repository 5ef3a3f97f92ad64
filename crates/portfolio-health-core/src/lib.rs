//! Quantitative portfolio analytics and health-scoring engine.
//!
//! Given a set of asset records and market assumptions, the engine produces
//! risk/return metrics, deterministic Monte Carlo drawdown and tail
//! statistics, a factor-model decomposition, a composite 0–100 health score
//! and a guardrail drift assessment — one immutable [`engine::MetricsResult`]
//! per call. The engine is pure and synchronous: no I/O, no shared state,
//! identical inputs always produce identical outputs.

pub mod allocation;
pub mod engine;
pub mod error;
pub mod health;
pub mod performance;
pub mod risk;
pub mod scoring;
pub mod simulation;
pub mod types;

pub use engine::{analyze_portfolio, MetricsResult};
pub use error::PortfolioHealthError;
pub use types::*;

/// Standard result type for all portfolio-health operations
pub type HealthResult<T> = Result<T, PortfolioHealthError>;

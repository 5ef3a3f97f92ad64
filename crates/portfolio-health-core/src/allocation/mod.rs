pub mod guardrails;
pub mod weights;

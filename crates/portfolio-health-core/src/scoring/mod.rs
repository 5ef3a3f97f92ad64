pub mod composite;
pub mod curves;
pub mod metrics;

pub mod covariance;
pub mod factors;

//! Metrics and Monitoring Adapters
//!
//! Prometheus metrics export on its own address and the `/live` and
//! `/ready` probes merged into the dashboard API router.

pub mod health;
pub mod prometheus;

pub use health::{health_routes, HealthState};
pub use prometheus::MetricsRegistry;

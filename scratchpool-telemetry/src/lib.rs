//! # scratchpool telemetry
//!
//! Logging bootstrap and Prometheus export of pool statistics.

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{MetricsError, PoolMetrics};

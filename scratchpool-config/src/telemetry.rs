//! Logging and metrics configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

/// Telemetry configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Default log level when `RUST_LOG` is unset.
    #[validate(custom(function = validation::validate_log_level))]
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prefix for exported metric names.
    #[validate(custom(function = validation::validate_metric_namespace))]
    #[serde(default = "default_namespace")]
    pub metrics_namespace: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_namespace() -> String {
    "scratchpool".into()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_namespace: default_namespace(),
        }
    }
}

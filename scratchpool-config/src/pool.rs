//! Pool sizing configuration.
//!
//! The size functions themselves come from the curve engine and are bound in
//! code; only the batch size and the cache policy are configurable.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Scratch pool parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of points one scratch buffer must support.
    #[validate(range(min = 1, max = 1048576))]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-category high-water mark. Unset keeps every released buffer.
    #[validate(range(min = 1))]
    #[serde(default)]
    pub max_cached: Option<usize>,
}

fn default_batch_size() -> usize {
    128
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_cached: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_default_pool_config() {
        PoolConfig::default()
            .validate()
            .expect("Default config should be valid");
    }

    #[test]
    fn zero_batch_size_invalid() {
        let config = PoolConfig {
            batch_size: 0,
            ..PoolConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_high_water_mark_invalid() {
        let config = PoolConfig {
            max_cached: Some(0),
            ..PoolConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

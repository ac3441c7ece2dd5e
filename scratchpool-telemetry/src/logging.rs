//! ## scratchpool-telemetry::logging
//! **`tracing` subscriber setup**
//!
//! The pool emits structured `tracing` events (initialization, misses,
//! rejections, teardown). This installs the fmt subscriber that prints them.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use scratchpool_config::TelemetryConfig;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins over the configured level. Returns `false` when a global
/// subscriber was already set, which is harmless.
pub fn init_logging(config: &TelemetryConfig) -> bool {
    fmt()
        .with_env_filter(filter(config))
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .try_init()
        .is_ok()
}

fn filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let config = TelemetryConfig::default();
        init_logging(&config);
        assert!(!init_logging(&config));
        tracing::info!("still logging after repeated init");
    }
}

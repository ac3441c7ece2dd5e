//! ## scratchpool-telemetry::metrics
//! **Prometheus exporter for pool statistics**
//!
//! The pool keeps its own atomic counters; this module mirrors a
//! [`PoolSnapshot`] into a registry so it can be scraped. Every series carries
//! a `category` label.

use prometheus::{Encoder, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;

use scratchpool_config::TelemetryConfig;
use scratchpool_core::alloc::{CategoryStats, PoolSnapshot};

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone)]
pub struct PoolMetrics {
    registry: Registry,
    batch_size: IntGauge,
    element_size: IntGaugeVec,
    cache_depth: IntGaugeVec,
    hits: IntGaugeVec,
    misses: IntGaugeVec,
    releases: IntGaugeVec,
    rejections: IntGaugeVec,
    evictions: IntGaugeVec,
}

impl PoolMetrics {
    pub fn new(config: &TelemetryConfig) -> Result<Self, MetricsError> {
        let registry = Registry::new();
        let ns = config.metrics_namespace.as_str();

        // Counters live in the pool; these gauges are set from snapshots, so
        // "_total" series are gauges rather than prometheus counters.
        let batch_size = IntGauge::with_opts(
            Opts::new("batch_size", "Configured batch size").namespace(ns),
        )?;
        registry.register(Box::new(batch_size.clone()))?;
        let element_size = gauge(
            &registry,
            ns,
            "element_size_bytes",
            "Fixed buffer size per category",
            &["category"],
        )?;
        let cache_depth = gauge(
            &registry,
            ns,
            "cache_depth",
            "Buffers parked in the category cache",
            &["category"],
        )?;
        let hits = gauge(&registry, ns, "hits_total", "Acquires served from cache", &["category"])?;
        let misses = gauge(
            &registry,
            ns,
            "misses_total",
            "Acquires that went to the backing allocator",
            &["category"],
        )?;
        let releases = gauge(&registry, ns, "releases_total", "Accepted releases", &["category"])?;
        let rejections = gauge(
            &registry,
            ns,
            "rejections_total",
            "Releases refused for wrong size",
            &["category"],
        )?;
        let evictions = gauge(
            &registry,
            ns,
            "evictions_total",
            "Releases freed at the high-water mark",
            &["category"],
        )?;

        Ok(Self {
            registry,
            batch_size,
            element_size,
            cache_depth,
            hits,
            misses,
            releases,
            rejections,
            evictions,
        })
    }

    /// Copies a snapshot into the registry.
    pub fn record(&self, snapshot: &PoolSnapshot) {
        self.batch_size.set(saturating_i64(snapshot.batch_size as u64));
        for stats in snapshot.iter() {
            self.record_category(stats);
        }
    }

    fn record_category(&self, stats: &CategoryStats) {
        let label = [stats.category.as_str()];
        let set = |vec: &IntGaugeVec, value: u64| {
            vec.with_label_values(&label).set(saturating_i64(value));
        };
        set(&self.element_size, stats.element_size as u64);
        set(&self.cache_depth, stats.cache_depth as u64);
        set(&self.hits, stats.hits);
        set(&self.misses, stats.misses);
        set(&self.releases, stats.releases);
        set(&self.rejections, stats.rejections);
        set(&self.evictions, stats.evictions);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders the registry in the Prometheus text format.
    pub fn gather(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn gauge(
    registry: &Registry,
    namespace: &str,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<IntGaugeVec, MetricsError> {
    let vec = IntGaugeVec::new(Opts::new(name, help).namespace(namespace), labels)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scratchpool_core::prelude::*;

    fn pool() -> ScratchPool {
        let sizing = PoolSizing {
            key_scratch: |batch| batch * 96,
            sig_scratch: |batch| batch * 192,
            pairing_buffer: || 32,
        };
        ScratchPool::new(SystemAllocator, 8, sizing).unwrap()
    }

    #[test]
    fn snapshot_is_exported_per_category() {
        let pool = pool();
        let buf = pool.acquire_key_scratch().unwrap();
        pool.release_key_scratch(buf).unwrap();
        let _ = pool.release_pairing_buffer(PairingBuffer::from_buffer(Buffer::zeroed(1)));

        let metrics = PoolMetrics::new(&TelemetryConfig::default()).unwrap();
        metrics.record(&pool.snapshot());
        let text = metrics.gather().unwrap();

        assert!(text.contains("scratchpool_batch_size 8"), "{text}");
        assert!(text.contains(r#"scratchpool_cache_depth{category="key_scratch"} 1"#));
        assert!(text.contains(r#"scratchpool_misses_total{category="key_scratch"} 1"#));
        assert!(text.contains(r#"scratchpool_element_size_bytes{category="sig_scratch"} 1536"#));
        assert!(text.contains(r#"scratchpool_rejections_total{category="pairing_buffer"} 1"#));
    }

    #[test]
    fn custom_namespace() {
        let config = TelemetryConfig {
            metrics_namespace: "verifier".into(),
            ..TelemetryConfig::default()
        };
        let metrics = PoolMetrics::new(&config).unwrap();
        metrics.record(&pool().snapshot());
        assert!(metrics.gather().unwrap().contains("verifier_cache_depth"));
    }

    #[test]
    fn recording_twice_overwrites() {
        let pool = pool();
        let metrics = PoolMetrics::new(&TelemetryConfig::default()).unwrap();
        let buf = pool.acquire_sig_scratch().unwrap();
        pool.release_sig_scratch(buf).unwrap();
        metrics.record(&pool.snapshot());

        let _held = pool.acquire_sig_scratch().unwrap();
        metrics.record(&pool.snapshot());
        let text = metrics.gather().unwrap();
        assert!(text.contains(r#"scratchpool_cache_depth{category="sig_scratch"} 0"#));
        assert!(text.contains(r#"scratchpool_hits_total{category="sig_scratch"} 1"#));
    }
}

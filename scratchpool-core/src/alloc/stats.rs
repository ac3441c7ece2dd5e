//! ## scratchpool-core::alloc::stats
//! **Per-category pool statistics**
//!
//! Each category keeps its own counters next to its cache, so recording a
//! statistic never touches another category's cache line.

use std::sync::atomic::{AtomicU64, Ordering};

use super::buffer::Category;

/// Live counters for one category.
///
/// This struct uses atomic operations for thread-safe statistics tracking.
#[derive(Debug, Default)]
pub struct CategoryCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    releases: AtomicU64,
    rejections: AtomicU64,
    evictions: AtomicU64,
}

impl CategoryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// An acquire was served from the cache.
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// An acquire found the cache empty and went to the backing allocator.
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A release was accepted.
    #[inline]
    pub fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// A release was refused because of its length.
    #[inline]
    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// An accepted release was freed instead of cached.
    #[inline]
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::Relaxed)
    }

    pub fn rejections(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStats {
    pub category: Category,
    pub element_size: usize,
    pub cache_depth: usize,
    pub hits: u64,
    pub misses: u64,
    pub releases: u64,
    pub rejections: u64,
    pub evictions: u64,
}

impl CategoryStats {
    pub(crate) fn capture(
        category: Category,
        element_size: usize,
        cache_depth: usize,
        counters: &CategoryCounters,
    ) -> Self {
        Self {
            category,
            element_size,
            cache_depth,
            hits: counters.hits(),
            misses: counters.misses(),
            releases: counters.releases(),
            rejections: counters.rejections(),
            evictions: counters.evictions(),
        }
    }

    /// Bytes currently parked in the cache.
    pub fn cached_bytes(&self) -> usize {
        self.cache_depth.saturating_mul(self.element_size)
    }
}

/// Point-in-time view of a whole pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub batch_size: usize,
    pub key_scratch: CategoryStats,
    pub sig_scratch: CategoryStats,
    pub pairing_buffer: CategoryStats,
}

impl PoolSnapshot {
    pub fn get(&self, category: Category) -> &CategoryStats {
        match category {
            Category::KeyScratch => &self.key_scratch,
            Category::SigScratch => &self.sig_scratch,
            Category::PairingBuffer => &self.pairing_buffer,
        }
    }

    /// Categories in [`Category::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryStats> {
        [&self.key_scratch, &self.sig_scratch, &self.pairing_buffer].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let counters = CategoryCounters::new();
        assert_eq!(counters.hits(), 0);
        assert_eq!(counters.misses(), 0);

        counters.record_hit();
        counters.record_miss();
        counters.record_miss();
        counters.record_release();
        counters.record_rejection();
        counters.record_eviction();

        assert_eq!(counters.hits(), 1);
        assert_eq!(counters.misses(), 2);
        assert_eq!(counters.releases(), 1);
        assert_eq!(counters.rejections(), 1);
        assert_eq!(counters.evictions(), 1);
    }

    #[test]
    fn counters_survive_concurrent_increments() {
        let counters = CategoryCounters::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        counters.record_hit();
                    }
                });
            }
        });
        assert_eq!(counters.hits(), 4000);
    }

    #[test]
    fn snapshot_lookup_by_category() {
        let counters = CategoryCounters::new();
        counters.record_hit();
        let key = CategoryStats::capture(Category::KeyScratch, 10, 3, &counters);
        let sig = CategoryStats::capture(Category::SigScratch, 20, 0, &CategoryCounters::new());
        let pairing =
            CategoryStats::capture(Category::PairingBuffer, 32, 1, &CategoryCounters::new());
        let snapshot = PoolSnapshot {
            batch_size: 4,
            key_scratch: key,
            sig_scratch: sig,
            pairing_buffer: pairing,
        };

        assert_eq!(snapshot.get(Category::KeyScratch).hits, 1);
        assert_eq!(snapshot.get(Category::KeyScratch).cached_bytes(), 30);
        let order: Vec<Category> = snapshot.iter().map(|s| s.category).collect();
        assert_eq!(order, Category::ALL);
    }
}

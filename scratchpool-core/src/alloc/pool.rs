//! ## scratchpool-core::alloc::pool
//! **Per-category scratch-buffer pool**
//!
//! [`ScratchPool`] recycles the working memory a batched curve engine needs:
//! key scratch, signature scratch and pairing accumulators. Each category has
//! a fixed element size computed once at construction, a LIFO cache and its
//! own lock, so traffic on one category never waits on another.
//!
//! ```text
//! acquire():                          release(buf):
//!   lock category                       check len == element_size
//!   pop newest cached buffer            lock category
//!   unlock                              push (or evict past max_cached)
//!   miss -> BackingAllocator::alloc     unlock
//! ```

use crossbeam::utils::CachePadded;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use scratchpool_config::PoolConfig;

use super::backing::{AllocError, BackingAllocator, SystemAllocator};
use super::buffer::{
    Buffer, Category, KeyKind, KeyScratch, Kind, PairingBuffer, PairingKind, Scratch, SigKind,
    SigScratch,
};
use super::stats::{CategoryCounters, CategoryStats, PoolSnapshot};
use crate::error::{PoolError, Rejected};

/// Size functions bound once when a pool is built.
///
/// Key and signature scratch scale with the batch size; the pairing
/// accumulator does not.
#[derive(Debug, Clone, Copy)]
pub struct PoolSizing {
    pub key_scratch: fn(usize) -> usize,
    pub sig_scratch: fn(usize) -> usize,
    pub pairing_buffer: fn() -> usize,
}

/// Construction parameters that are not size functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum number of points one scratch buffer must support.
    pub batch_size: usize,
    /// Per-category high-water mark. `None` caches without limit.
    pub max_cached: Option<usize>,
}

impl PoolOptions {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            max_cached: None,
        }
    }

    pub fn with_max_cached(mut self, max_cached: usize) -> Self {
        self.max_cached = Some(max_cached);
        self
    }
}

impl From<&PoolConfig> for PoolOptions {
    fn from(config: &PoolConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            max_cached: config.max_cached,
        }
    }
}

struct CategoryState {
    element_size: usize,
    cache: Mutex<Vec<Buffer>>,
    counters: CategoryCounters,
}

impl CategoryState {
    fn new(element_size: usize) -> Self {
        Self {
            element_size,
            cache: Mutex::new(Vec::new()),
            counters: CategoryCounters::new(),
        }
    }
}

/// Buffers and bytes handed back to the allocator for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Drained {
    pub buffers: usize,
    pub bytes: usize,
}

/// What [`ScratchPool::teardown`] returned to the backing allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub key_scratch: Drained,
    pub sig_scratch: Drained,
    pub pairing_buffer: Drained,
}

impl TeardownReport {
    pub fn total_buffers(&self) -> usize {
        self.key_scratch.buffers + self.sig_scratch.buffers + self.pairing_buffer.buffers
    }

    pub fn total_bytes(&self) -> usize {
        self.key_scratch.bytes + self.sig_scratch.bytes + self.pairing_buffer.bytes
    }
}

/// Concurrent pool of fixed-size scratch buffers, one cache per [`Category`].
///
/// Share it between workers by reference or through an `Arc`. Buffers held by
/// callers are independent allocations, so dropping the pool never invalidates
/// a handle; it only stops that handle from being recycled.
pub struct ScratchPool<A: BackingAllocator = SystemAllocator> {
    allocator: A,
    batch_size: usize,
    max_cached: Option<usize>,
    key_scratch: CachePadded<CategoryState>,
    sig_scratch: CachePadded<CategoryState>,
    pairing_buffer: CachePadded<CategoryState>,
}

impl<A: BackingAllocator> ScratchPool<A> {
    /// Builds a pool with unbounded caches.
    pub fn new(allocator: A, batch_size: usize, sizing: PoolSizing) -> Result<Self, PoolError> {
        Self::with_options(allocator, PoolOptions::new(batch_size), sizing)
    }

    /// Builds a pool from loaded configuration.
    pub fn from_config(
        allocator: A,
        config: &PoolConfig,
        sizing: PoolSizing,
    ) -> Result<Self, PoolError> {
        Self::with_options(allocator, PoolOptions::from(config), sizing)
    }

    pub fn with_options(
        allocator: A,
        options: PoolOptions,
        sizing: PoolSizing,
    ) -> Result<Self, PoolError> {
        let PoolOptions {
            batch_size,
            max_cached,
        } = options;

        if batch_size == 0 {
            return Err(PoolError::InvalidConfig("batch size must be positive".into()));
        }
        if max_cached == Some(0) {
            return Err(PoolError::InvalidConfig(
                "max_cached must be positive when set".into(),
            ));
        }

        allocator.prepare().map_err(|e| {
            error!(error = %e, "backing allocator setup failed");
            match e {
                AllocError::Setup(msg) => PoolError::AllocatorSetup(msg),
                other => PoolError::AllocatorSetup(other.to_string()),
            }
        })?;

        let key_size = checked_size(Category::KeyScratch, (sizing.key_scratch)(batch_size))?;
        let sig_size = checked_size(Category::SigScratch, (sizing.sig_scratch)(batch_size))?;
        let pairing_size = checked_size(Category::PairingBuffer, (sizing.pairing_buffer)())?;

        info!(
            batch_size,
            key_scratch = key_size,
            sig_scratch = sig_size,
            pairing_buffer = pairing_size,
            max_cached = ?max_cached,
            "scratch pool initialized"
        );

        Ok(Self {
            allocator,
            batch_size,
            max_cached,
            key_scratch: CachePadded::new(CategoryState::new(key_size)),
            sig_scratch: CachePadded::new(CategoryState::new(sig_size)),
            pairing_buffer: CachePadded::new(CategoryState::new(pairing_size)),
        })
    }

    /// Hands out a key-scratch buffer.
    pub fn acquire_key_scratch(&self) -> Result<KeyScratch, PoolError> {
        self.acquire::<KeyKind>()
    }

    /// Hands out a signature-scratch buffer.
    pub fn acquire_sig_scratch(&self) -> Result<SigScratch, PoolError> {
        self.acquire::<SigKind>()
    }

    /// Hands out a pairing accumulator buffer.
    pub fn acquire_pairing_buffer(&self) -> Result<PairingBuffer, PoolError> {
        self.acquire::<PairingKind>()
    }

    /// Returns a key-scratch buffer to its cache.
    pub fn release_key_scratch(&self, buffer: KeyScratch) -> Result<(), Rejected<KeyKind>> {
        self.release(buffer)
    }

    /// Returns a signature-scratch buffer to its cache.
    pub fn release_sig_scratch(&self, buffer: SigScratch) -> Result<(), Rejected<SigKind>> {
        self.release(buffer)
    }

    /// Returns a pairing accumulator buffer to its cache.
    pub fn release_pairing_buffer(
        &self,
        buffer: PairingBuffer,
    ) -> Result<(), Rejected<PairingKind>> {
        self.release(buffer)
    }

    /// Hands out a buffer of kind `K`, reusing the most recently released one
    /// when the cache is non-empty.
    ///
    /// A failed acquire leaves the cache exactly as it found it.
    pub fn acquire<K: Kind>(&self) -> Result<Scratch<K>, PoolError> {
        let category = K::CATEGORY;
        let state = self.state(category);
        let expected = state.element_size;

        {
            let mut cache = state.cache.lock();
            if let Some(buffer) = cache.pop() {
                let actual = buffer.len();
                if actual != expected {
                    cache.push(buffer);
                    drop(cache);
                    error!(%category, expected, actual, "cached buffer failed size check");
                    return Err(PoolError::InvalidBufferSize {
                        category,
                        expected,
                        actual,
                    });
                }
                drop(cache);
                state.counters.record_hit();
                return Ok(Scratch::from_buffer(buffer));
            }
        }

        // Allocation runs outside the lock.
        state.counters.record_miss();
        let buffer = self.allocator.alloc(expected).map_err(|e| {
            error!(%category, requested = expected, error = %e, "scratch allocation failed");
            PoolError::from_alloc(category, e)
        })?;

        let actual = buffer.len();
        if actual != expected {
            self.allocator.free(buffer);
            error!(%category, expected, actual, "backing allocator returned wrong size");
            return Err(PoolError::InvalidBufferSize {
                category,
                expected,
                actual,
            });
        }

        debug!(%category, size = expected, "allocated fresh scratch buffer");
        Ok(Scratch::from_buffer(buffer))
    }

    /// Returns a buffer to its category cache.
    ///
    /// A buffer of the wrong length is refused and handed back inside the
    /// error; it never enters the cache.
    pub fn release<K: Kind>(&self, buffer: Scratch<K>) -> Result<(), Rejected<K>> {
        let category = K::CATEGORY;
        let state = self.state(category);
        let expected = state.element_size;
        let actual = buffer.len();

        if actual != expected {
            state.counters.record_rejection();
            warn!(%category, expected, actual, "rejected buffer of wrong size");
            return Err(Rejected::new(
                buffer,
                PoolError::InvalidBufferSize {
                    category,
                    expected,
                    actual,
                },
            ));
        }

        let buffer = buffer.into_buffer();
        let evicted = {
            let mut cache = state.cache.lock();
            match self.max_cached {
                Some(limit) if cache.len() >= limit => Some(buffer),
                _ => {
                    cache.push(buffer);
                    None
                }
            }
        };
        state.counters.record_release();

        if let Some(buffer) = evicted {
            state.counters.record_eviction();
            debug!(%category, size = expected, "cache at high-water mark, freeing buffer");
            self.allocator.free(buffer);
        }
        Ok(())
    }

    /// Drains every cache into the backing allocator and consumes the pool.
    ///
    /// Handles still held by callers stay valid; they simply can no longer be
    /// released into this pool.
    pub fn teardown(mut self) -> TeardownReport {
        let report = self.drain();
        info!(
            buffers = report.total_buffers(),
            bytes = report.total_bytes(),
            "scratch pool torn down"
        );
        report
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn max_cached(&self) -> Option<usize> {
        self.max_cached
    }

    pub fn element_size(&self, category: Category) -> usize {
        self.state(category).element_size
    }

    pub fn cache_depth(&self, category: Category) -> usize {
        self.state(category).cache.lock().len()
    }

    pub fn stats(&self, category: Category) -> CategoryStats {
        let state = self.state(category);
        CategoryStats::capture(
            category,
            state.element_size,
            state.cache.lock().len(),
            &state.counters,
        )
    }

    /// Stats for every category. Each category is read under its own lock,
    /// so the three views are not taken at one instant.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            batch_size: self.batch_size,
            key_scratch: self.stats(Category::KeyScratch),
            sig_scratch: self.stats(Category::SigScratch),
            pairing_buffer: self.stats(Category::PairingBuffer),
        }
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    #[inline]
    fn state(&self, category: Category) -> &CategoryState {
        match category {
            Category::KeyScratch => &*self.key_scratch,
            Category::SigScratch => &*self.sig_scratch,
            Category::PairingBuffer => &*self.pairing_buffer,
        }
    }

    fn drain(&mut self) -> TeardownReport {
        let Self {
            allocator,
            key_scratch,
            sig_scratch,
            pairing_buffer,
            ..
        } = self;

        TeardownReport {
            key_scratch: drain_category(allocator, key_scratch),
            sig_scratch: drain_category(allocator, sig_scratch),
            pairing_buffer: drain_category(allocator, pairing_buffer),
        }
    }
}

impl<A: BackingAllocator> Drop for ScratchPool<A> {
    fn drop(&mut self) {
        let report = self.drain();
        if report.total_buffers() > 0 {
            debug!(
                buffers = report.total_buffers(),
                bytes = report.total_bytes(),
                "scratch pool dropped without teardown, cache drained"
            );
        }
    }
}

impl<A: BackingAllocator> std::fmt::Debug for ScratchPool<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchPool")
            .field("batch_size", &self.batch_size)
            .field("max_cached", &self.max_cached)
            .field("key_scratch", &self.element_size(Category::KeyScratch))
            .field("sig_scratch", &self.element_size(Category::SigScratch))
            .field("pairing_buffer", &self.element_size(Category::PairingBuffer))
            .finish_non_exhaustive()
    }
}

fn checked_size(category: Category, size: usize) -> Result<usize, PoolError> {
    if size == 0 {
        return Err(PoolError::InvalidConfig(format!(
            "{category} element size must be non-zero"
        )));
    }
    Ok(size)
}

fn drain_category<A: BackingAllocator>(allocator: &A, state: &mut CategoryState) -> Drained {
    let buffers = std::mem::take(state.cache.get_mut());
    let mut drained = Drained::default();
    for buffer in buffers {
        drained.buffers += 1;
        drained.bytes += buffer.len();
        allocator.free(buffer);
    }
    drained
}

//! ## scratchpool-core::alloc::backing
//! **Backing allocators that supply fresh memory on a cache miss**
//!
//! The pool only recycles memory; it asks a [`BackingAllocator`] for new
//! buffers and gives buffers back to it on eviction and teardown.
//! Implementations are shared across worker threads and must be `Send + Sync`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;

use super::buffer::Buffer;

/// Failures reported by a backing allocator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("cannot allocate {requested} bytes")]
    OutOfMemory { requested: usize },

    #[error("allocator setup failed: {0}")]
    Setup(String),
}

/// Source of fresh buffers for a pool.
pub trait BackingAllocator: Send + Sync {
    /// Called once when a pool is constructed.
    fn prepare(&self) -> Result<(), AllocError> {
        Ok(())
    }

    /// Returns a buffer of exactly `len` bytes.
    fn alloc(&self, len: usize) -> Result<Buffer, AllocError>;

    /// Takes back a buffer previously returned by [`alloc`](Self::alloc).
    fn free(&self, buffer: Buffer);
}

impl<A: BackingAllocator + ?Sized> BackingAllocator for Arc<A> {
    fn prepare(&self) -> Result<(), AllocError> {
        (**self).prepare()
    }

    fn alloc(&self, len: usize) -> Result<Buffer, AllocError> {
        (**self).alloc(len)
    }

    fn free(&self, buffer: Buffer) {
        (**self).free(buffer)
    }
}

/// Global-heap allocator.
///
/// Uses fallible reservation so an exhausted heap surfaces as
/// [`AllocError::OutOfMemory`] instead of aborting the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl BackingAllocator for SystemAllocator {
    fn alloc(&self, len: usize) -> Result<Buffer, AllocError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| AllocError::OutOfMemory { requested: len })?;
        bytes.resize(len, 0u8);
        Ok(Buffer::from_boxed(bytes.into_boxed_slice()))
    }

    fn free(&self, buffer: Buffer) {
        drop(buffer);
    }
}

/// Wraps another allocator and caps the bytes it may have outstanding.
///
/// Bytes are charged on `alloc` and credited on `free`, so the budget bounds
/// everything a pool holds in its caches plus everything its callers hold.
#[derive(Debug)]
pub struct BudgetAllocator<A = SystemAllocator> {
    inner: A,
    budget: usize,
    in_use: AtomicUsize,
}

impl BudgetAllocator<SystemAllocator> {
    /// Budgeted global-heap allocator.
    pub fn system(budget: usize) -> Self {
        Self::new(SystemAllocator, budget)
    }
}

impl<A: BackingAllocator> BudgetAllocator<A> {
    pub fn new(inner: A, budget: usize) -> Self {
        Self {
            inner,
            budget,
            in_use: AtomicUsize::new(0),
        }
    }

    /// Total byte budget.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Bytes currently charged against the budget.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }
}

impl<A: BackingAllocator> BackingAllocator for BudgetAllocator<A> {
    fn prepare(&self) -> Result<(), AllocError> {
        if self.budget == 0 {
            return Err(AllocError::Setup("byte budget must be non-zero".into()));
        }
        self.inner.prepare()
    }

    fn alloc(&self, len: usize) -> Result<Buffer, AllocError> {
        let budget = self.budget;
        self.in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(len).filter(|&total| total <= budget)
            })
            .map_err(|_| AllocError::OutOfMemory { requested: len })?;

        let buffer = self.inner.alloc(len).inspect_err(|_| self.credit(len))?;

        // Charge what the inner allocator actually handed out, so the later
        // credit in `free` matches.
        let actual = buffer.len();
        if actual < len {
            self.credit(len - actual);
        } else if actual > len {
            self.in_use.fetch_add(actual - len, Ordering::AcqRel);
        }
        Ok(buffer)
    }

    fn free(&self, buffer: Buffer) {
        let len = buffer.len();
        self.inner.free(buffer);
        self.credit(len);
    }
}

impl<A> BudgetAllocator<A> {
    // A same-length buffer from another allocator can be freed here; it was
    // never charged, so the credit saturates at zero instead of wrapping.
    fn credit(&self, len: usize) {
        let _ = self
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                Some(used.saturating_sub(len))
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_allocator_returns_exact_zeroed_length() {
        let buffer = SystemAllocator.alloc(96).unwrap();
        assert_eq!(buffer.len(), 96);
        assert!(buffer.iter().all(|&b| b == 0));
        SystemAllocator.free(buffer);
    }

    #[test]
    fn system_allocator_reports_impossible_request() {
        assert_eq!(
            SystemAllocator.alloc(usize::MAX).unwrap_err(),
            AllocError::OutOfMemory {
                requested: usize::MAX
            }
        );
    }

    #[test]
    fn budget_charges_and_credits() {
        let allocator = BudgetAllocator::system(100);
        let a = allocator.alloc(60).unwrap();
        assert_eq!(allocator.in_use(), 60);

        assert!(matches!(
            allocator.alloc(50),
            Err(AllocError::OutOfMemory { requested: 50 })
        ));
        assert_eq!(allocator.in_use(), 60);

        allocator.free(a);
        assert_eq!(allocator.in_use(), 0);
        let b = allocator.alloc(100).unwrap();
        assert_eq!(allocator.in_use(), 100);
        allocator.free(b);
    }

    #[test]
    fn uncharged_free_saturates_at_zero() {
        let ours = BudgetAllocator::system(64);
        let charged = ours.alloc(16).unwrap();
        let foreign = SystemAllocator.alloc(48).unwrap();

        ours.free(foreign);
        assert_eq!(ours.in_use(), 0);
        ours.free(charged);
        assert_eq!(ours.in_use(), 0);

        let fresh = ours.alloc(64).unwrap();
        assert_eq!(ours.in_use(), 64);
        ours.free(fresh);
    }

    /// Hands back half of what was asked.
    struct HalfAllocator;

    impl BackingAllocator for HalfAllocator {
        fn alloc(&self, len: usize) -> Result<Buffer, AllocError> {
            SystemAllocator.alloc(len / 2)
        }

        fn free(&self, buffer: Buffer) {
            SystemAllocator.free(buffer);
        }
    }

    #[test]
    fn charge_follows_returned_length() {
        let allocator = BudgetAllocator::new(HalfAllocator, 100);
        let buffer = allocator.alloc(40).unwrap();
        assert_eq!(buffer.len(), 20);
        assert_eq!(allocator.in_use(), 20);
        allocator.free(buffer);
        assert_eq!(allocator.in_use(), 0);
    }

    #[test]
    fn zero_budget_fails_setup() {
        assert!(matches!(
            BudgetAllocator::system(0).prepare(),
            Err(AllocError::Setup(_))
        ));
    }

    #[test]
    fn arc_forwards_to_inner() {
        let shared = Arc::new(BudgetAllocator::system(64));
        let handle = Arc::clone(&shared);
        let buffer = handle.alloc(32).unwrap();
        assert_eq!(shared.in_use(), 32);
        handle.free(buffer);
        assert_eq!(shared.in_use(), 0);
    }
}

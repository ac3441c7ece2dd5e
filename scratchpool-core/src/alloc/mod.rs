//! ## scratchpool-core::alloc
//! **Scratch-buffer pooling for batched curve operations**
//!
//! ### Key Submodules:
//! - `buffer/`: Owned buffers, categories and typed per-category handles
//! - `backing/`: Backing allocators consulted on a cache miss
//! - `pool/`: The per-category pool itself
//! - `stats/`: Per-category counters and snapshots

pub mod backing;
pub mod buffer;
pub mod pool;
pub mod stats;

pub use backing::{AllocError, BackingAllocator, BudgetAllocator, SystemAllocator};
pub use buffer::{
    Buffer, Category, KeyKind, KeyScratch, Kind, PairingBuffer, PairingKind, Scratch, SigKind,
    SigScratch,
};
pub use pool::{Drained, PoolOptions, PoolSizing, ScratchPool, TeardownReport};
pub use stats::{CategoryCounters, CategoryStats, PoolSnapshot};

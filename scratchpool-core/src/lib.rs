//! # scratchpool-core
//!
//! Working-memory pool for batched elliptic-curve primitives.
//! The curve engine itself is an outside collaborator; this crate only
//! hands out, takes back and finally frees the buffers that engine needs.
//!
//! ### Expectations (Production):
//! - No lock shared between buffer categories
//! - No allocation on a cache hit
//! - Every misuse surfaces as an error, never as a silently wrong buffer
//!
//! ### Key Submodules:
//! - `alloc`: Pool core, buffer handles, backing allocators and statistics
//! - `error`: Pool error type
//!
//! ```
//! use scratchpool_core::prelude::*;
//!
//! let sizing = PoolSizing {
//!     key_scratch: |batch| batch * 96,
//!     sig_scratch: |batch| batch * 192,
//!     pairing_buffer: || 32,
//! };
//! let pool = ScratchPool::new(SystemAllocator, 128, sizing)?;
//!
//! let scratch = pool.acquire_key_scratch()?;
//! assert_eq!(scratch.len(), 128 * 96);
//! pool.release_key_scratch(scratch)?;
//!
//! let report = pool.teardown();
//! assert_eq!(report.key_scratch.buffers, 1);
//! # Ok::<(), PoolError>(())
//! ```

pub mod alloc;
pub mod error;

pub mod prelude {
    pub use crate::alloc::*;
    pub use crate::error::*;
}

pub use alloc::ScratchPool;
pub use error::{PoolError, Rejected};

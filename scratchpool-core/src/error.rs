use thiserror::Error;

use crate::alloc::backing::AllocError;
use crate::alloc::buffer::{Category, Kind, Scratch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Out of memory: cannot allocate {requested} bytes for {category}")]
    OutOfMemory { category: Category, requested: usize },

    #[error("Invalid {category} buffer size: expected {expected} bytes, got {actual}")]
    InvalidBufferSize {
        category: Category,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Allocator setup failed: {0}")]
    AllocatorSetup(String),
}

impl PoolError {
    pub(crate) fn from_alloc(category: Category, err: AllocError) -> Self {
        match err {
            AllocError::OutOfMemory { requested } => PoolError::OutOfMemory {
                category,
                requested,
            },
            AllocError::Setup(msg) => PoolError::AllocatorSetup(msg),
        }
    }
}

/// A release the pool refused. Carries the buffer back to the caller, who
/// now owns its disposal.
#[derive(Debug, Error)]
#[error("{category} buffer rejected by pool", category = K::CATEGORY)]
pub struct Rejected<K: Kind> {
    buffer: Scratch<K>,
    #[source]
    error: PoolError,
}

impl<K: Kind> Rejected<K> {
    pub(crate) fn new(buffer: Scratch<K>, error: PoolError) -> Self {
        Self { buffer, error }
    }

    pub fn error(&self) -> &PoolError {
        &self.error
    }

    pub fn into_buffer(self) -> Scratch<K> {
        self.buffer
    }

    pub fn into_parts(self) -> (Scratch<K>, PoolError) {
        (self.buffer, self.error)
    }
}

impl<K: Kind> From<Rejected<K>> for PoolError {
    fn from(rejected: Rejected<K>) -> Self {
        rejected.error
    }
}

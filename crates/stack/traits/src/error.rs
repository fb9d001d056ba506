//! Error type shared between the core and chain backends.

use keel_domain::BlockId;
use keel_kv::KvError;
use thiserror::Error;

/// Error type for chain backend and lifecycle operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The requested block or height is unknown.
    ///
    /// This is the one condition the core recovers from locally, by
    /// recording a missing-cache entry.
    #[error("block not found")]
    NotFound,

    /// The backend rejected the supplied bytes.
    #[error("failed to parse block: {0}")]
    Parse(String),

    /// The backend could not produce a child block.
    #[error("failed to build block: {0}")]
    Build(String),

    /// Syntactic or semantic verification failed.
    #[error("block verification failed: {0}")]
    Verify(String),

    /// The underlying store failed.
    #[error("storage error: {0}")]
    Storage(#[from] KvError),

    /// Accept or reject was driven on a block with no retained decider.
    #[error("no decider retained for block {0}")]
    InvalidDecider(BlockId),

    /// The supplied genesis payload is unusable or conflicts with the chain
    /// already on disk.
    #[error("invalid genesis: {0}")]
    Genesis(String),

    /// The backend configuration bytes could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An operation was driven before `initialize` completed.
    #[error("vm not initialized")]
    NotInitialized,
}

impl ChainError {
    /// Whether this error is the cacheable not-found condition.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

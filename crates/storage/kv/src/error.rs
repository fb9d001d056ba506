//! Error types for key-value storage operations.

use thiserror::Error;

/// Error type for key-value storage operations.
#[derive(Debug, Error)]
pub enum KvError {
    /// The underlying store failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value did not have the expected shape.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

//! The database trait every keel backend stores through.

use crate::KvError;

/// A single operation inside an atomic batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    /// Set a key to a value.
    Put(Vec<u8>, Vec<u8>),
    /// Remove a key.
    Delete(Vec<u8>),
}

/// A byte-oriented key-value store.
///
/// Implementations are cheaply cloneable handles onto shared state and are
/// safe to use from multiple tasks. Reads return `None` for absent keys;
/// "not found" is not an error at this layer.
pub trait Database: Clone + Send + Sync + 'static {
    /// Get the value stored at `key`.
    fn get(&self, key: &[u8]) -> impl std::future::Future<Output = Result<Option<Vec<u8>>, KvError>> + Send;

    /// Set `key` to `value`.
    fn put(&self, key: &[u8], value: Vec<u8>) -> impl std::future::Future<Output = Result<(), KvError>> + Send;

    /// Remove `key` if present.
    fn delete(&self, key: &[u8]) -> impl std::future::Future<Output = Result<(), KvError>> + Send;

    /// Whether `key` is present.
    fn has(&self, key: &[u8]) -> impl std::future::Future<Output = Result<bool, KvError>> + Send;

    /// Apply every operation in `ops` atomically.
    fn write_batch(&self, ops: Vec<BatchOp>) -> impl std::future::Future<Output = Result<(), KvError>> + Send;
}

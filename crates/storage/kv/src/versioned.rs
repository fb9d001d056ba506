//! Buffered write overlay with atomic commit.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;

use crate::{BatchOp, Database, KvError};

#[derive(Clone, Debug)]
enum Pending {
    Put(Vec<u8>),
    Delete,
}

/// A write-buffering overlay on top of a [`Database`].
///
/// Writes and deletes accumulate in memory and are visible to reads through
/// this overlay; [`Versioned::commit`] flushes everything to the base store
/// in a single atomic batch, while [`Versioned::abort`] discards the buffer.
/// Clones share one buffer, so partitions mounted over the same overlay
/// commit together.
#[derive(Clone, Debug)]
pub struct Versioned<D> {
    base: D,
    pending: Arc<Mutex<BTreeMap<Vec<u8>, Pending>>>,
}

impl<D: Database> Versioned<D> {
    /// Create a new overlay over `base` with an empty buffer.
    pub fn new(base: D) -> Self {
        Self { base, pending: Arc::new(Mutex::new(BTreeMap::new())) }
    }

    /// Number of buffered operations not yet committed.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Flush every buffered operation to the base store atomically.
    ///
    /// The buffer is drained only once the base accepts the batch; on error
    /// the buffer is left intact so the caller can abort explicitly.
    pub async fn commit(&self) -> Result<(), KvError> {
        let ops: Vec<BatchOp> = {
            let pending = self.pending.lock();
            pending
                .iter()
                .map(|(key, op)| match op {
                    Pending::Put(value) => BatchOp::Put(key.clone(), value.clone()),
                    Pending::Delete => BatchOp::Delete(key.clone()),
                })
                .collect()
        };
        if ops.is_empty() {
            return Ok(());
        }
        self.base.write_batch(ops).await?;
        self.pending.lock().clear();
        Ok(())
    }

    /// Discard every buffered operation.
    pub fn abort(&self) {
        self.pending.lock().clear();
    }
}

impl<D: Database> Database for Versioned<D> {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        let buffered = self.pending.lock().get(key).cloned();
        match buffered {
            Some(Pending::Put(value)) => Ok(Some(value)),
            Some(Pending::Delete) => Ok(None),
            None => self.base.get(key).await,
        }
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), KvError> {
        self.pending.lock().insert(key.to_vec(), Pending::Put(value));
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), KvError> {
        self.pending.lock().insert(key.to_vec(), Pending::Delete);
        Ok(())
    }

    async fn has(&self, key: &[u8]) -> Result<bool, KvError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), KvError> {
        let mut pending = self.pending.lock();
        for op in ops {
            match op {
                BatchOp::Put(key, value) => {
                    pending.insert(key, Pending::Put(value));
                }
                BatchOp::Delete(key) => {
                    pending.insert(key, Pending::Delete);
                }
            }
        }
        Ok(())
    }
}

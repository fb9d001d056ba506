//! Key-namespace partitions over a shared database.

use crate::{BatchOp, Database, KvError};

/// A view of a [`Database`] under a fixed key prefix.
///
/// Every key is namespaced by prepending the prefix, so independent
/// partitions can share one physical store without colliding.
#[derive(Clone, Debug)]
pub struct PrefixDb<D> {
    prefix: Vec<u8>,
    inner: D,
}

impl<D: Database> PrefixDb<D> {
    /// Create a partition of `inner` under `prefix`.
    pub fn new(prefix: &[u8], inner: D) -> Self {
        Self { prefix: prefix.to_vec(), inner }
    }

    fn prefixed(&self, key: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.prefix.len() + key.len());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(key);
        out
    }
}

impl<D: Database> Database for PrefixDb<D> {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        self.inner.get(&self.prefixed(key)).await
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), KvError> {
        self.inner.put(&self.prefixed(key), value).await
    }

    async fn delete(&self, key: &[u8]) -> Result<(), KvError> {
        self.inner.delete(&self.prefixed(key)).await
    }

    async fn has(&self, key: &[u8]) -> Result<bool, KvError> {
        self.inner.has(&self.prefixed(key)).await
    }

    async fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), KvError> {
        let ops = ops
            .into_iter()
            .map(|op| match op {
                BatchOp::Put(key, value) => BatchOp::Put(self.prefixed(&key), value),
                BatchOp::Delete(key) => BatchOp::Delete(self.prefixed(&key)),
            })
            .collect();
        self.inner.write_batch(ops).await
    }
}

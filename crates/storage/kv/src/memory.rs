//! In-memory database implementation.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;

use crate::{BatchOp, Database, KvError};

/// In-memory [`Database`] backed by a BTreeMap.
///
/// Used for tests and single-process deployments; every clone shares the
/// same underlying map.
#[derive(Clone, Debug, Default)]
pub struct MemDb {
    inner: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemDb {
    /// Create a new empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the database holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl Database for MemDb {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.inner.read().get(key).cloned())
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), KvError> {
        self.inner.write().insert(key.to_vec(), value);
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), KvError> {
        self.inner.write().remove(key);
        Ok(())
    }

    async fn has(&self, key: &[u8]) -> Result<bool, KvError> {
        Ok(self.inner.read().contains_key(key))
    }

    async fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), KvError> {
        let mut inner = self.inner.write();
        for op in ops {
            match op {
                BatchOp::Put(key, value) => {
                    inner.insert(key, value);
                }
                BatchOp::Delete(key) => {
                    inner.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let db = MemDb::new();
        assert!(db.get(b"a").await.unwrap().is_none());

        db.put(b"a", vec![1, 2, 3]).await.unwrap();
        assert_eq!(db.get(b"a").await.unwrap(), Some(vec![1, 2, 3]));
        assert!(db.has(b"a").await.unwrap());

        db.delete(b"a").await.unwrap();
        assert!(db.get(b"a").await.unwrap().is_none());
        assert!(!db.has(b"a").await.unwrap());
    }

    #[tokio::test]
    async fn put_overwrites() {
        let db = MemDb::new();
        db.put(b"k", vec![1]).await.unwrap();
        db.put(b"k", vec![2]).await.unwrap();
        assert_eq!(db.get(b"k").await.unwrap(), Some(vec![2]));
        assert_eq!(db.len(), 1);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let db = MemDb::new();
        let other = db.clone();
        db.put(b"k", vec![7]).await.unwrap();
        assert_eq!(other.get(b"k").await.unwrap(), Some(vec![7]));
    }

    #[tokio::test]
    async fn batch_applies_all_ops() {
        let db = MemDb::new();
        db.put(b"gone", vec![0]).await.unwrap();

        db.write_batch(vec![
            BatchOp::Put(b"a".to_vec(), vec![1]),
            BatchOp::Put(b"b".to_vec(), vec![2]),
            BatchOp::Delete(b"gone".to_vec()),
        ])
        .await
        .unwrap();

        assert_eq!(db.get(b"a").await.unwrap(), Some(vec![1]));
        assert_eq!(db.get(b"b").await.unwrap(), Some(vec![2]));
        assert!(db.get(b"gone").await.unwrap().is_none());
    }
}

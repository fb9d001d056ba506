//! Persisted chain state: the accepted-chain index and timestamp records.

use alloy_primitives::B256;
use keel_domain::BlockId;
use keel_kv::{Database, KvError, PrefixDb, Versioned};
use keel_traits::StatelessBlock as _;

use crate::{DataHash, TimestampBlock};

const HEIGHT_PREFIX: &[u8] = b"height";
const BLOCK_PREFIX: &[u8] = b"block";
const ACCEPTED_PREFIX: &[u8] = b"accepted";
const STATE_PREFIX: &[u8] = b"state";

const ACCEPTED_KEY: &[u8] = b"acceptedBlock";

/// The timestamp chain's stores, mounted as partitions of one database.
///
/// All writes go through a shared buffered overlay: an accept stages the
/// height index entry, the block bytes, the timestamp record, and the
/// last-accepted pointer, then commits them as one atomic batch. Reads see
/// staged writes, so the overlay behaves like the eventual database state.
#[derive(Clone, Debug)]
pub struct ChainState<D: Database> {
    overlay: Versioned<D>,
    height_index: PrefixDb<Versioned<D>>,
    block_index: PrefixDb<Versioned<D>>,
    accepted_index: PrefixDb<Versioned<D>>,
    state_index: PrefixDb<Versioned<D>>,
}

impl<D: Database> ChainState<D> {
    /// Mount the chain's partitions over `db`.
    pub fn new(db: D) -> Self {
        let overlay = Versioned::new(db);
        Self {
            height_index: PrefixDb::new(HEIGHT_PREFIX, overlay.clone()),
            block_index: PrefixDb::new(BLOCK_PREFIX, overlay.clone()),
            accepted_index: PrefixDb::new(ACCEPTED_PREFIX, overlay.clone()),
            state_index: PrefixDb::new(STATE_PREFIX, overlay.clone()),
            overlay,
        }
    }

    /// Persist `block` as accepted: height index, block bytes, timestamp
    /// record, and the last-accepted pointer, committed atomically.
    pub async fn put_accepted(&self, block: &TimestampBlock) -> Result<(), KvError> {
        let staged = self.stage_accept(block).await;
        let result = match staged {
            Ok(()) => self.overlay.commit().await,
            Err(err) => Err(err),
        };
        if result.is_err() {
            self.overlay.abort();
        }
        result
    }

    async fn stage_accept(&self, block: &TimestampBlock) -> Result<(), KvError> {
        let id = block.id();
        self.height_index
            .put(&height_key(block.height()), id.0.as_slice().to_vec())
            .await?;
        self.block_index.put(id.0.as_slice(), block.bytes().to_vec()).await?;
        self.state_index
            .put(&timestamp_key(block.timestamp()), block.data_hash().0.as_slice().to_vec())
            .await?;
        self.accepted_index.put(ACCEPTED_KEY, id.0.as_slice().to_vec()).await?;
        Ok(())
    }

    /// Id of the accepted block at `height`, if the chain has reached it.
    pub async fn block_id_at_height(&self, height: u64) -> Result<Option<BlockId>, KvError> {
        match self.height_index.get(&height_key(height)).await? {
            Some(bytes) => decode_b256(&bytes).map(|id| Some(BlockId(id))),
            None => Ok(None),
        }
    }

    /// The persisted last-accepted pointer.
    pub async fn last_accepted(&self) -> Result<Option<BlockId>, KvError> {
        match self.accepted_index.get(ACCEPTED_KEY).await? {
            Some(bytes) => decode_b256(&bytes).map(|id| Some(BlockId(id))),
            None => Ok(None),
        }
    }

    /// Canonical bytes of an accepted block.
    pub async fn block_bytes(&self, id: BlockId) -> Result<Option<Vec<u8>>, KvError> {
        self.block_index.get(id.0.as_slice()).await
    }

    /// The payload fingerprint recorded at `timestamp`.
    pub async fn data_hash_at(&self, timestamp: i64) -> Result<Option<DataHash>, KvError> {
        match self.state_index.get(&timestamp_key(timestamp)).await? {
            Some(bytes) => decode_b256(&bytes).map(|hash| Some(DataHash(hash))),
            None => Ok(None),
        }
    }
}

fn height_key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

fn timestamp_key(timestamp: i64) -> [u8; 8] {
    (timestamp as u64).to_be_bytes()
}

fn decode_b256(bytes: &[u8]) -> Result<B256, KvError> {
    if bytes.len() != 32 {
        return Err(KvError::Corrupt(format!("expected 32 bytes, got {}", bytes.len())));
    }
    Ok(B256::from_slice(bytes))
}

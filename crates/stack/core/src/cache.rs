//! The block cache and lifecycle state machine.

use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use keel_domain::{BlockId, Status};
use keel_traits::{ChainBackend, ChainError, Decider as _, StatelessBlock as _};
use tracing::{debug, info, warn};

use crate::{CacheConfig, LruCache, WrappedBlock};

/// Shared handle to a wrapped block served by a [`BlockCache`].
pub type SharedBlock<C> =
    Arc<WrappedBlock<<C as ChainBackend>::Block, <C as ChainBackend>::Decider>>;

/// Serves deduplicated wrapped blocks to the consensus engine and drives the
/// verify/accept/reject lifecycle against the backend.
///
/// The engine serializes every call under its own lock, so the cache takes
/// `&mut self` and holds no locks of its own. Lookups resolve through four
/// tiers: blocks currently in consensus, decided blocks, unverified blocks,
/// and a negative cache of ids known to be missing; on a full miss the
/// backend is consulted and the result ingested with a freshly computed
/// status.
#[derive(Debug)]
pub struct BlockCache<C: ChainBackend> {
    backend: C,

    /// Blocks that passed verification and are currently in consensus.
    /// Never evicted while tracked here.
    verified: HashMap<BlockId, SharedBlock<C>>,
    /// Blocks that have been decided (accepted or rejected).
    decided: LruCache<BlockId, SharedBlock<C>>,
    /// Processing blocks that have not yet passed verification.
    unverified: LruCache<BlockId, SharedBlock<C>>,
    /// Ids the backend reported as not found.
    missing: LruCache<BlockId, ()>,
    /// Canonical encoding to id, deduplicating repeated parses.
    bytes_to_id: LruCache<Bytes, BlockId>,

    last_accepted: SharedBlock<C>,
    preferred: SharedBlock<C>,
}

impl<C: ChainBackend> BlockCache<C> {
    /// Create a cache seeded with the chain's last accepted block, which
    /// also becomes the initial build preference.
    pub fn new(backend: C, last_accepted: C::Block, config: CacheConfig) -> Self {
        let last_accepted = Arc::new(WrappedBlock::new(last_accepted, Status::Accepted));
        let mut decided = LruCache::new(config.decided);
        decided.put(last_accepted.id(), Arc::clone(&last_accepted));

        Self {
            backend,
            verified: HashMap::new(),
            decided,
            unverified: LruCache::new(config.unverified),
            missing: LruCache::new(config.missing),
            bytes_to_id: LruCache::new(config.bytes_to_id),
            preferred: Arc::clone(&last_accepted),
            last_accepted,
        }
    }

    /// Resolve `id` to its canonical wrapped block.
    ///
    /// Checks the caches in priority order, then falls through to the
    /// backend. A backend miss is recorded in the negative cache so the
    /// next lookup short-circuits.
    pub async fn get_block(&mut self, id: BlockId) -> Result<SharedBlock<C>, ChainError> {
        if let Some(block) = self.cached_block(&id) {
            return Ok(block);
        }
        if self.missing.get(&id).is_some() {
            return Err(ChainError::NotFound);
        }

        let fetched = self.backend.get_block(id).await;
        match fetched {
            Ok(block) => self.ingest_outside_consensus(block).await,
            Err(ChainError::NotFound) => {
                self.missing.put(id, ());
                Err(ChainError::NotFound)
            }
            Err(err) => Err(err),
        }
    }

    /// Parse `bytes` into its canonical wrapped block.
    ///
    /// Repeated parses of the same encoding reuse the cached id and handle
    /// without invoking the backend again.
    pub async fn parse_block(&mut self, bytes: &[u8]) -> Result<SharedBlock<C>, ChainError> {
        let key = Bytes::copy_from_slice(bytes);
        let cached_id = self.bytes_to_id.get(&key).copied();
        if let Some(id) = cached_id {
            if let Some(block) = self.cached_block(&id) {
                return Ok(block);
            }
        }

        let block = self.backend.parse_block(bytes).await?;
        let id = block.id();
        self.bytes_to_id.put(key, id);

        // Only re-check by id if the byte lookup above could not: a block
        // parsed concurrently into consensus must be returned unique.
        if cached_id.is_none() {
            if let Some(block) = self.cached_block(&id) {
                return Ok(block);
            }
        }

        self.missing.evict(&id);
        self.ingest_outside_consensus(block).await
    }

    /// Build a child of the preferred block and register it.
    pub async fn build_block(&mut self) -> Result<SharedBlock<C>, ChainError> {
        let parent = Arc::clone(&self.preferred);
        let block = self.backend.build_block(parent.inner()).await?;

        let id = block.id();
        // Defensive: the backend should not produce an id that is already
        // tracked, but if it does the existing handle wins.
        if let Some(existing) = self.cached_block(&id) {
            return Ok(existing);
        }
        self.missing.evict(&id);
        self.ingest_outside_consensus(block).await
    }

    /// Mark `id` as the tip to build on.
    pub async fn set_preference(&mut self, id: BlockId) -> Result<(), ChainError> {
        self.preferred = self.get_block(id).await?;
        Ok(())
    }

    /// Id of the last accepted block.
    pub fn last_accepted(&self) -> BlockId {
        self.last_accepted.id()
    }

    /// Handle to the last accepted block.
    pub fn last_accepted_block(&self) -> &SharedBlock<C> {
        &self.last_accepted
    }

    /// Handle to the current build preference.
    pub fn preferred_block(&self) -> &SharedBlock<C> {
        &self.preferred
    }

    /// Verify `block` against its parent and begin tracking it in consensus.
    ///
    /// Verifying a block that is already tracked is a no-op success. On
    /// success the backend's decider is retained on the handle for the
    /// terminal accept or reject.
    pub async fn verify(&mut self, block: &SharedBlock<C>) -> Result<(), ChainError> {
        let id = block.id();
        if self.verified.contains_key(&id) {
            return Ok(());
        }

        let parent = self.get_block(block.parent()).await?;
        let decider = self.backend.verify_block(parent.inner(), block.inner()).await?;
        block.set_decider(decider);

        self.unverified.evict(&id);
        self.verified.insert(id, Arc::clone(block));
        Ok(())
    }

    /// Accept `block`: commit its decider, mark it accepted, and advance the
    /// last-accepted pointer.
    ///
    /// A failed commit leaves the block unaccepted; the caller must not
    /// treat it as final.
    pub async fn accept(&mut self, block: &SharedBlock<C>) -> Result<(), ChainError> {
        let id = block.id();
        let decider = block.take_decider().ok_or(ChainError::InvalidDecider(id))?;
        decider.accept().await?;

        block.set_status(Status::Accepted);
        self.verified.remove(&id);
        self.decided.put(id, Arc::clone(block));
        self.last_accepted = Arc::clone(block);

        info!(%id, height = block.height(), "accepted block");
        Ok(())
    }

    /// Reject `block`: abandon its decider and mark it rejected.
    pub async fn reject(&mut self, block: &SharedBlock<C>) -> Result<(), ChainError> {
        let id = block.id();
        let decider = block.take_decider().ok_or(ChainError::InvalidDecider(id))?;
        decider.abandon().await?;

        block.set_status(Status::Rejected);
        self.verified.remove(&id);
        self.decided.put(id, Arc::clone(block));

        debug!(%id, height = block.height(), "rejected block");
        Ok(())
    }

    /// Abandon every block still in consensus and drop the caches.
    ///
    /// Called on shutdown; abandon failures are logged and skipped so every
    /// tracked block gets its terminal call.
    pub async fn shutdown(&mut self) {
        for (id, block) in std::mem::take(&mut self.verified) {
            let Some(decider) = block.take_decider() else {
                continue;
            };
            if let Err(err) = decider.abandon().await {
                warn!(%id, %err, "failed to abandon verified block during shutdown");
            }
        }
        self.flush();
    }

    /// Drop every cache tier.
    pub fn flush(&mut self) {
        self.decided.flush();
        self.unverified.flush();
        self.missing.flush();
        self.bytes_to_id.flush();
    }

    fn cached_block(&mut self, id: &BlockId) -> Option<SharedBlock<C>> {
        if let Some(block) = self.verified.get(id) {
            return Some(Arc::clone(block));
        }
        if let Some(block) = self.decided.get(id) {
            return Some(Arc::clone(block));
        }
        if let Some(block) = self.unverified.get(id) {
            return Some(Arc::clone(block));
        }
        None
    }

    /// Wrap a block that is not currently tracked by consensus and place it
    /// in the tier matching its status.
    async fn ingest_outside_consensus(
        &mut self,
        block: C::Block,
    ) -> Result<SharedBlock<C>, ChainError> {
        let id = block.id();
        let status = self.status_of(&block).await?;
        let wrapped = Arc::new(WrappedBlock::new(block, status));

        if status.is_decided() {
            self.decided.put(id, Arc::clone(&wrapped));
        } else {
            self.unverified.put(id, Arc::clone(&wrapped));
        }
        Ok(wrapped)
    }

    /// Compute the status of a block from the accepted chain.
    ///
    /// Above the last accepted height every block is still processing.
    /// At or below it, the height index decides: an unmapped height means
    /// the accepted chain has not reached there (a fork candidate), a
    /// matching id means accepted, and a different id means a sibling won.
    async fn status_of(&self, block: &C::Block) -> Result<Status, ChainError> {
        if block.height() > self.last_accepted.height() {
            return Ok(Status::Processing);
        }

        match self.backend.get_block_id_at_height(block.height()).await {
            Ok(accepted_id) if accepted_id == block.id() => Ok(Status::Accepted),
            Ok(_) => Ok(Status::Rejected),
            Err(ChainError::NotFound) => Ok(Status::Processing),
            Err(err) => Err(err),
        }
    }
}

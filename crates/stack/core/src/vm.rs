//! The VM adapter bridging the consensus engine and a chain backend.

use keel_domain::BlockId;
use keel_traits::{ApiHandler, ChainError, EngineSender, VmBackend, VmState};
use tracing::info;

use crate::{BlockCache, CacheConfig, SharedBlock};

/// Plugs a chain backend beneath the operations a consensus engine expects.
///
/// Lifecycle calls (`initialize`, `health_check`, `set_state`, `shutdown`,
/// handler factories) delegate to the backend; block operations route
/// through the [`BlockCache`], which is constructed during `initialize`
/// once the backend has seeded its chain.
#[derive(Debug)]
pub struct ChainVm<C: VmBackend> {
    backend: C,
    cache_config: CacheConfig,
    cache: Option<BlockCache<C>>,
}

impl<C: VmBackend> ChainVm<C> {
    /// Create an adapter over `backend` with default cache sizing.
    pub fn new(backend: C) -> Self {
        Self::with_cache_config(backend, CacheConfig::default())
    }

    /// Create an adapter over `backend` with explicit cache sizing.
    pub fn with_cache_config(backend: C, cache_config: CacheConfig) -> Self {
        Self { backend, cache_config, cache: None }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &C {
        &self.backend
    }

    fn cache(&self) -> Result<&BlockCache<C>, ChainError> {
        self.cache.as_ref().ok_or(ChainError::NotInitialized)
    }

    fn cache_mut(&mut self) -> Result<&mut BlockCache<C>, ChainError> {
        self.cache.as_mut().ok_or(ChainError::NotInitialized)
    }

    /// Initialize the backend and build the block cache.
    ///
    /// The backend seeds genesis on a fresh chain during its own
    /// initialize, so the last-accepted pointer read here always resolves.
    pub async fn initialize(
        &mut self,
        genesis: &[u8],
        config: &[u8],
        engine: EngineSender,
    ) -> Result<(), ChainError> {
        self.backend.initialize(genesis, config, engine).await?;

        let last_accepted_id = self.backend.last_accepted().await?;
        let last_accepted = self.backend.get_block(last_accepted_id).await?;
        self.cache =
            Some(BlockCache::new(self.backend.clone(), last_accepted, self.cache_config.clone()));

        info!(%last_accepted_id, "chain vm initialized");
        Ok(())
    }

    /// Resolve a block id to its canonical wrapped block.
    pub async fn get_block(&mut self, id: BlockId) -> Result<SharedBlock<C>, ChainError> {
        self.cache_mut()?.get_block(id).await
    }

    /// Parse raw bytes into a canonical wrapped block.
    pub async fn parse_block(&mut self, bytes: &[u8]) -> Result<SharedBlock<C>, ChainError> {
        self.cache_mut()?.parse_block(bytes).await
    }

    /// Build a child of the preferred block.
    pub async fn build_block(&mut self) -> Result<SharedBlock<C>, ChainError> {
        self.cache_mut()?.build_block().await
    }

    /// Mark the block to build on.
    pub async fn set_preference(&mut self, id: BlockId) -> Result<(), ChainError> {
        self.cache_mut()?.set_preference(id).await
    }

    /// Id of the last accepted block.
    pub fn last_accepted(&self) -> Result<BlockId, ChainError> {
        Ok(self.cache()?.last_accepted())
    }

    /// Read the accepted-chain height index.
    pub async fn get_block_id_at_height(&self, height: u64) -> Result<BlockId, ChainError> {
        self.backend.get_block_id_at_height(height).await
    }

    /// Verify a block against its parent.
    pub async fn verify(&mut self, block: &SharedBlock<C>) -> Result<(), ChainError> {
        self.cache_mut()?.verify(block).await
    }

    /// Accept a verified block.
    pub async fn accept(&mut self, block: &SharedBlock<C>) -> Result<(), ChainError> {
        self.cache_mut()?.accept(block).await
    }

    /// Reject a verified block.
    pub async fn reject(&mut self, block: &SharedBlock<C>) -> Result<(), ChainError> {
        self.cache_mut()?.reject(block).await
    }

    /// Report backend health.
    pub async fn health_check(&self) -> Result<(), ChainError> {
        self.backend.health_check().await
    }

    /// Communicate the engine's next state to the backend.
    pub async fn set_state(&self, state: VmState) -> Result<(), ChainError> {
        self.backend.set_state(state).await
    }

    /// The backend's version string.
    pub fn version(&self) -> &'static str {
        self.backend.version()
    }

    /// Handlers served before the chain is initialized.
    pub async fn create_static_handlers(&self) -> Result<Vec<ApiHandler>, ChainError> {
        self.backend.create_static_handlers().await
    }

    /// Handlers served for the running chain.
    pub async fn create_handlers(&self) -> Result<Vec<ApiHandler>, ChainError> {
        self.backend.create_handlers().await
    }

    /// Drop every cache tier, forcing later lookups back to the backend.
    pub fn flush(&mut self) -> Result<(), ChainError> {
        self.cache_mut()?.flush();
        Ok(())
    }

    /// Abandon in-flight blocks, drop the caches, and shut the backend down.
    pub async fn shutdown(&mut self) -> Result<(), ChainError> {
        if let Some(cache) = self.cache.as_mut() {
            cache.shutdown().await;
        }
        self.backend.shutdown().await
    }
}

//! The timestamp chain VM.

use std::{
    sync::{Arc, OnceLock},
    time::{SystemTime, UNIX_EPOCH},
};

use keel_domain::BlockId;
use keel_kv::Database;
use keel_stack::Mempool;
use keel_traits::{
    ApiHandler, ChainBackend, ChainError, Decider, EngineSender, StatelessBlock as _, VmBackend,
    VmState,
};
use tracing::{debug, info};

use crate::{
    service::TimestampService, ChainState, DataHash, TimestampApiServer as _, TimestampBlock,
    VmConfig,
};

/// Human-readable VM name.
pub const VM_NAME: &str = "timestampvm";

/// VM version reported to the host.
pub const VM_VERSION: &str = "v0.0.1";

#[derive(Debug)]
struct VmInner {
    mempool: Mempool<DataHash>,
    future_slack_seconds: u64,
}

/// A chain that timestamps 32-byte payload fingerprints.
///
/// Each block extends its parent with one fingerprint popped from the
/// mempool. Construction mounts the persistent state; `initialize` parses
/// the configuration, wires the engine signal, and seeds genesis on a
/// fresh chain.
#[derive(Clone, Debug)]
pub struct TimestampVm<D: Database> {
    state: ChainState<D>,
    inner: Arc<OnceLock<VmInner>>,
}

impl<D: Database> TimestampVm<D> {
    /// Mount the chain over `db`.
    pub fn new(db: D) -> Self {
        Self { state: ChainState::new(db), inner: Arc::new(OnceLock::new()) }
    }

    /// The chain's persistent state.
    pub fn state(&self) -> &ChainState<D> {
        &self.state
    }

    /// The build mempool; available once initialized.
    pub fn mempool(&self) -> Result<&Mempool<DataHash>, ChainError> {
        Ok(&self.inner()?.mempool)
    }

    fn inner(&self) -> Result<&VmInner, ChainError> {
        self.inner.get().ok_or(ChainError::NotInitialized)
    }

    /// Seed genesis on a fresh chain, or check the existing chain matches
    /// the supplied payload.
    async fn seed_genesis(&self, genesis: &[u8]) -> Result<(), ChainError> {
        let data_hash =
            DataHash::from_payload(genesis).map_err(|err| ChainError::Genesis(err.to_string()))?;
        let genesis_block = TimestampBlock::genesis(data_hash);

        match self.state.block_id_at_height(0).await? {
            Some(id) if id == genesis_block.id() => Ok(()),
            Some(id) => Err(ChainError::Genesis(format!(
                "chain is seeded with a different genesis block {id}"
            ))),
            None => {
                self.state.put_accepted(&genesis_block).await?;
                info!(id = %genesis_block.id(), "seeded genesis block");
                Ok(())
            }
        }
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

impl<D: Database> ChainBackend for TimestampVm<D> {
    type Block = TimestampBlock;
    type Decider = ChainDecider<D>;

    async fn parse_block(&self, bytes: &[u8]) -> Result<TimestampBlock, ChainError> {
        TimestampBlock::parse(bytes)
    }

    async fn build_block(&self, parent: &TimestampBlock) -> Result<TimestampBlock, ChainError> {
        let inner = self.inner()?;
        let result = match inner.mempool.pending() {
            Some(data_hash) => {
                Ok(TimestampBlock::new(parent.id(), parent.height() + 1, now_unix(), data_hash))
            }
            None => Err(ChainError::Build("empty mempool".to_string())),
        };
        // Re-arm the build signal whether or not this attempt produced a
        // block, so queued work is never stranded.
        inner.mempool.notify_build_block();
        result
    }

    async fn verify_block(
        &self,
        parent: &TimestampBlock,
        block: &TimestampBlock,
    ) -> Result<ChainDecider<D>, ChainError> {
        let expected_height = parent.height() + 1;
        if block.height() != expected_height {
            return Err(ChainError::Verify(format!(
                "expected block at height {expected_height}, found {}",
                block.height()
            )));
        }

        if block.timestamp() < parent.timestamp() {
            return Err(ChainError::Verify(format!(
                "block timestamp {} is earlier than parent timestamp {}",
                block.timestamp(),
                parent.timestamp()
            )));
        }

        let slack = self.inner()?.future_slack_seconds;
        let limit = now_unix() + slack as i64;
        if block.timestamp() >= limit {
            return Err(ChainError::Verify(format!(
                "block timestamp {} is more than {slack}s ahead of local time",
                block.timestamp()
            )));
        }

        Ok(ChainDecider { block: block.clone(), state: self.state.clone() })
    }

    async fn last_accepted(&self) -> Result<BlockId, ChainError> {
        self.state.last_accepted().await?.ok_or(ChainError::NotFound)
    }

    async fn get_block_id_at_height(&self, height: u64) -> Result<BlockId, ChainError> {
        self.state.block_id_at_height(height).await?.ok_or(ChainError::NotFound)
    }

    async fn get_block(&self, id: BlockId) -> Result<TimestampBlock, ChainError> {
        let bytes = self.state.block_bytes(id).await?.ok_or(ChainError::NotFound)?;
        TimestampBlock::parse(&bytes)
    }
}

impl<D: Database> VmBackend for TimestampVm<D> {
    async fn initialize(
        &self,
        genesis: &[u8],
        config: &[u8],
        engine: EngineSender,
    ) -> Result<(), ChainError> {
        let config = VmConfig::from_bytes(config)?;
        let mempool = Mempool::new(config.mempool_capacity);
        mempool.attach_engine(engine);

        self.seed_genesis(genesis).await?;

        // A repeat initialize keeps the original wiring.
        let _ = self
            .inner
            .set(VmInner { mempool, future_slack_seconds: config.future_slack_seconds });

        info!(
            version = VM_VERSION,
            mempool_capacity = config.mempool_capacity,
            "timestamp vm initialized"
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChainError> {
        Ok(())
    }

    async fn set_state(&self, state: VmState) -> Result<(), ChainError> {
        debug!(?state, "engine state change");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChainError> {
        Ok(())
    }

    fn version(&self) -> &'static str {
        VM_VERSION
    }

    async fn create_static_handlers(&self) -> Result<Vec<ApiHandler>, ChainError> {
        Ok(Vec::new())
    }

    async fn create_handlers(&self) -> Result<Vec<ApiHandler>, ChainError> {
        let service = TimestampService::new(self.clone());
        Ok(vec![ApiHandler { prefix: "/timestamp".to_string(), methods: service.into_rpc().into() }])
    }
}

/// Decider pinning a verified block until the engine decides it.
///
/// Accept persists the accepted-chain record and commits; abandon discards
/// the block, which was never staged, so there is nothing to clean up.
#[derive(Debug)]
pub struct ChainDecider<D: Database> {
    block: TimestampBlock,
    state: ChainState<D>,
}

impl<D: Database> Decider for ChainDecider<D> {
    async fn accept(self) -> Result<(), ChainError> {
        self.state.put_accepted(&self.block).await?;
        debug!(id = %self.block.id(), height = self.block.height(), "persisted accepted block");
        Ok(())
    }

    async fn abandon(self) -> Result<(), ChainError> {
        Ok(())
    }
}

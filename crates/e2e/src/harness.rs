//! Single-node test harness for the timestamp chain.

use keel_kv::MemDb;
use keel_stack::{ChainVm, MempoolError, SharedBlock};
use keel_timestamp::{DataHash, TimestampVm};
use keel_traits::{engine_channel, ChainError, EngineMessage, EngineReceiver};
use tracing::debug;

/// The VM adapter type the harness drives.
pub type TimestampChainVm = ChainVm<TimestampVm<MemDb>>;

/// Shared block handle served by the harness VM.
pub type HarnessBlock = SharedBlock<TimestampVm<MemDb>>;

/// A fully wired single-node timestamp chain.
///
/// The harness owns the VM adapter and the engine's receiving end of the
/// build signal, and plays the consensus driver: proposals go through the
/// backend mempool and [`ChainHarness::advance`] runs one
/// build-verify-accept round the way an engine would.
#[derive(Debug)]
pub struct ChainHarness {
    vm: TimestampChainVm,
    engine: EngineReceiver,
}

impl ChainHarness {
    /// Boot a fresh chain from `genesis` with default configuration.
    pub async fn start(genesis: &[u8]) -> Result<Self, ChainError> {
        Self::start_with_config(genesis, b"").await
    }

    /// Boot a fresh chain from `genesis` with explicit VM config bytes.
    pub async fn start_with_config(genesis: &[u8], config: &[u8]) -> Result<Self, ChainError> {
        init_tracing();

        let (engine_tx, engine_rx) = engine_channel();
        let mut vm = ChainVm::new(TimestampVm::new(MemDb::new()));
        vm.initialize(genesis, config, engine_tx).await?;

        debug!(last_accepted = %vm.last_accepted()?, "harness chain booted");
        Ok(Self { vm, engine: engine_rx })
    }

    /// The VM adapter under test.
    pub fn vm(&mut self) -> &mut TimestampChainVm {
        &mut self.vm
    }

    /// A handle onto the backend beneath the adapter.
    pub fn backend(&self) -> TimestampVm<MemDb> {
        self.vm.backend().clone()
    }

    /// Propose a payload the way the RPC service would.
    ///
    /// Returns whether the payload was queued; `false` means the mempool
    /// was full.
    pub fn propose(&self, payload: &[u8]) -> Result<bool, ChainError> {
        let data_hash = DataHash::from_payload(payload)?;
        match self.backend().mempool()?.add(data_hash) {
            Ok(()) => Ok(true),
            Err(MempoolError::Full { .. }) => Ok(false),
        }
    }

    /// Drain one pending engine signal, if any.
    pub fn try_signal(&mut self) -> Option<EngineMessage> {
        self.engine.try_recv().ok()
    }

    /// Run one consensus round: build on the preference, verify, accept,
    /// and prefer the new block.
    pub async fn advance(&mut self) -> Result<HarnessBlock, ChainError> {
        let block = self.vm.build_block().await?;
        self.vm.verify(&block).await?;
        self.vm.accept(&block).await?;
        self.vm.set_preference(block.id()).await?;
        Ok(block)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

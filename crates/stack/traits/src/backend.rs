//! Operation surfaces the core requires from an embedded backend.

use std::future::Future;

use jsonrpsee::Methods;
use keel_domain::BlockId;

use crate::{ChainError, EngineSender, StatelessBlock};

/// A one-shot capability returned from block verification.
///
/// The decider pins whatever side state the backend must commit or discard
/// for a verified block. Exactly one terminal operation is consumed per
/// decider; the move-only receiver makes double consumption unrepresentable.
pub trait Decider: Send + 'static {
    /// Commit the pinned state; the block is final.
    fn accept(self) -> impl Future<Output = Result<(), ChainError>> + Send;

    /// Discard the pinned state; the block will never be accepted.
    fn abandon(self) -> impl Future<Output = Result<(), ChainError>> + Send;
}

/// A decider with nothing to commit or discard.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDecider;

impl Decider for NoopDecider {
    async fn accept(self) -> Result<(), ChainError> {
        Ok(())
    }

    async fn abandon(self) -> Result<(), ChainError> {
        Ok(())
    }
}

/// Block-level operations the core drives on a backend.
///
/// Implementations are cheaply cloneable handles onto shared state; every
/// method takes `&self` and may suspend on I/O. The core never inspects
/// block bytes itself.
pub trait ChainBackend: Clone + Send + Sync + 'static {
    /// The concrete stateless block this backend produces.
    type Block: StatelessBlock;
    /// The capability returned from [`ChainBackend::verify_block`].
    type Decider: Decider;

    /// Parse a block from its canonical encoding.
    ///
    /// Deterministic: parsing the bytes of a well-formed block yields an
    /// equal block.
    fn parse_block(
        &self,
        bytes: &[u8],
    ) -> impl Future<Output = Result<Self::Block, ChainError>> + Send;

    /// Build a well-formed child of `parent`.
    fn build_block(
        &self,
        parent: &Self::Block,
    ) -> impl Future<Output = Result<Self::Block, ChainError>> + Send;

    /// Verify `block` against its parent, pinning any state needed for a
    /// later accept.
    fn verify_block(
        &self,
        parent: &Self::Block,
        block: &Self::Block,
    ) -> impl Future<Output = Result<Self::Decider, ChainError>> + Send;

    /// Read the persisted last-accepted pointer.
    ///
    /// Returns [`ChainError::NotFound`] on a chain that has never accepted
    /// a block.
    fn last_accepted(&self) -> impl Future<Output = Result<BlockId, ChainError>> + Send;

    /// Read the accepted-chain height index.
    fn get_block_id_at_height(
        &self,
        height: u64,
    ) -> impl Future<Output = Result<BlockId, ChainError>> + Send;

    /// Read and parse a persisted block.
    fn get_block(
        &self,
        id: BlockId,
    ) -> impl Future<Output = Result<Self::Block, ChainError>> + Send;
}

/// The state the engine communicates to a VM as it starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VmState {
    /// The engine is replaying or fetching historical blocks.
    Bootstrapping,
    /// The engine is participating in consensus.
    NormalOp,
}

/// A named JSON-RPC module a backend exposes through its host.
pub struct ApiHandler {
    /// Path the host should mount the module under, e.g. `/timestamp`.
    pub prefix: String,
    /// The registered RPC methods.
    pub methods: Methods,
}

impl std::fmt::Debug for ApiHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHandler").field("prefix", &self.prefix).finish()
    }
}

/// Lifecycle surface a backend exposes to the VM adapter.
pub trait VmBackend: ChainBackend {
    /// Wire the backend up: mount storage, parse `config`, seed genesis on a
    /// fresh chain, and retain `engine` for build notifications.
    fn initialize(
        &self,
        genesis: &[u8],
        config: &[u8],
        engine: EngineSender,
    ) -> impl Future<Output = Result<(), ChainError>> + Send;

    /// Report backend health; called periodically by the host.
    fn health_check(&self) -> impl Future<Output = Result<(), ChainError>> + Send;

    /// Communicate the engine's next state to the backend.
    fn set_state(&self, state: VmState) -> impl Future<Output = Result<(), ChainError>> + Send;

    /// Release resources; called when the node shuts down.
    fn shutdown(&self) -> impl Future<Output = Result<(), ChainError>> + Send;

    /// The backend's version string.
    fn version(&self) -> &'static str;

    /// Handlers served before the chain is initialized.
    fn create_static_handlers(
        &self,
    ) -> impl Future<Output = Result<Vec<ApiHandler>, ChainError>> + Send;

    /// Handlers served for the running chain.
    fn create_handlers(&self) -> impl Future<Output = Result<Vec<ApiHandler>, ChainError>> + Send;
}

//! The core's handle to a block in the lifecycle.

use bytes::Bytes;
use keel_domain::{BlockId, Status};
use keel_traits::StatelessBlock;
use parking_lot::{Mutex, RwLock};

/// A stateless block wrapped with its lifecycle state.
///
/// Handles are shared as `Arc<WrappedBlock>`; the cache guarantees at most
/// one wrapped block per id is visible at any time. Status and the retained
/// decider sit behind cheap cells so handles stay `Send + Sync` while the
/// cache's own maps remain single-writer and unlocked.
pub struct WrappedBlock<B, D> {
    inner: B,
    status: RwLock<Status>,
    decider: Mutex<Option<D>>,
}

impl<B: StatelessBlock, D> WrappedBlock<B, D> {
    pub(crate) fn new(inner: B, status: Status) -> Self {
        Self { inner, status: RwLock::new(status), decider: Mutex::new(None) }
    }

    /// The wrapped stateless block.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Content hash of the block's canonical encoding.
    pub fn id(&self) -> BlockId {
        self.inner.id()
    }

    /// Identifier of the parent block.
    pub fn parent(&self) -> BlockId {
        self.inner.parent()
    }

    /// Height of this block.
    pub fn height(&self) -> u64 {
        self.inner.height()
    }

    /// Proposal time in unix seconds.
    pub fn timestamp(&self) -> i64 {
        self.inner.timestamp()
    }

    /// The block's canonical encoding.
    pub fn bytes(&self) -> &Bytes {
        self.inner.bytes()
    }

    /// Current consensus status.
    pub fn status(&self) -> Status {
        *self.status.read()
    }

    pub(crate) fn set_status(&self, status: Status) {
        *self.status.write() = status;
    }

    pub(crate) fn set_decider(&self, decider: D) {
        *self.decider.lock() = Some(decider);
    }

    pub(crate) fn take_decider(&self) -> Option<D> {
        self.decider.lock().take()
    }

    #[cfg(test)]
    pub(crate) fn has_decider(&self) -> bool {
        self.decider.lock().is_some()
    }
}

impl<B: StatelessBlock, D> std::fmt::Debug for WrappedBlock<B, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedBlock")
            .field("inner", &self.inner)
            .field("status", &self.status())
            .finish()
    }
}

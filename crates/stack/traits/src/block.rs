//! The capability set every stateless block exposes to the core.

use bytes::Bytes;
use keel_domain::BlockId;

/// An immutable, content-addressed block as produced by a backend.
///
/// The core relies only on these accessors; a backend owns the concrete
/// encoding and must uphold `id() == BlockId::of_bytes(bytes())` for every
/// block it parses or builds. Blocks are values: cheap to clone and equal
/// by id.
pub trait StatelessBlock: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Content hash of the canonical encoding.
    fn id(&self) -> BlockId;

    /// Identifier of the parent block ([`BlockId::EMPTY`] for genesis).
    fn parent(&self) -> BlockId;

    /// Height of this block; genesis is height 0.
    fn height(&self) -> u64;

    /// Proposal time in unix seconds; genesis is time 0.
    fn timestamp(&self) -> i64;

    /// The canonical encoding this block was parsed from or built into.
    fn bytes(&self) -> &Bytes;
}

//! Identifiers

use alloy_primitives::B256;
use bytes::{Buf, BufMut};
use commonware_codec::{Error as CodecError, FixedSize, Read, Write};
use commonware_cryptography::{Hasher as _, Sha256};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Block identifier (32 bytes), the content hash of a block's canonical
/// encoding.
pub struct BlockId(pub B256);

impl BlockId {
    /// The all-zero identifier, used as the parent of the genesis block.
    pub const EMPTY: Self = Self(B256::ZERO);

    /// Compute the identifier of a canonical block encoding.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::default();
        hasher.update(bytes);
        Self(B256::from_slice(hasher.finalize().as_ref()))
    }

    /// Whether this is the empty (genesis parent) identifier.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier encoding helpers.
#[derive(Debug)]
pub struct Idents;

impl Idents {
    /// Encode a `B256` into the buffer as raw bytes.
    pub fn write_b256(value: &B256, buf: &mut impl BufMut) {
        buf.put_slice(value.as_slice());
    }

    /// Decode a `B256` from the buffer, returning an error if insufficient bytes remain.
    pub fn read_b256(buf: &mut impl Buf) -> Result<B256, CodecError> {
        if buf.remaining() < 32 {
            return Err(CodecError::EndOfBuffer);
        }
        let mut out = [0u8; 32];
        buf.copy_to_slice(&mut out);
        Ok(B256::from(out))
    }
}

impl FixedSize for BlockId {
    const SIZE: usize = 32;
}

impl Write for BlockId {
    fn write(&self, buf: &mut impl BufMut) {
        Idents::write_b256(&self.0, buf);
    }
}

impl Read for BlockId {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &Self::Cfg) -> Result<Self, CodecError> {
        Ok(Self(Idents::read_b256(buf)?))
    }
}

//! Block type for the timestamp chain.

use alloy_primitives::B256;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use commonware_codec::{Error as CodecError, FixedSize, Read, ReadExt as _, Write};
use keel_domain::{BlockId, Idents};
use keel_traits::{ChainError, StatelessBlock};

/// Fingerprint of the payload a block timestamps (32 bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DataHash(pub B256);

impl DataHash {
    /// Build a fingerprint from an arbitrary payload of at most 32 bytes,
    /// right-padding with zeros.
    pub fn from_payload(payload: &[u8]) -> Result<Self, ChainError> {
        if payload.len() > Self::SIZE {
            return Err(ChainError::Parse(format!(
                "payload is {} bytes, expected at most {}",
                payload.len(),
                Self::SIZE
            )));
        }
        let mut out = [0u8; Self::SIZE];
        out[..payload.len()].copy_from_slice(payload);
        Ok(Self(B256::from(out)))
    }
}

impl std::fmt::Display for DataHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FixedSize for DataHash {
    const SIZE: usize = 32;
}

impl Write for DataHash {
    fn write(&self, buf: &mut impl BufMut) {
        Idents::write_b256(&self.0, buf);
    }
}

impl Read for DataHash {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &Self::Cfg) -> Result<Self, CodecError> {
        Ok(Self(Idents::read_b256(buf)?))
    }
}

/// A block that timestamps one payload fingerprint.
///
/// The canonical encoding is the parent id, height, timestamp, and data
/// hash in order, all fixed width; the id is the SHA-256 digest of that
/// encoding. Both are computed once at construction and carried alongside
/// the content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimestampBlock {
    parent: BlockId,
    height: u64,
    timestamp: i64,
    data_hash: DataHash,

    id: BlockId,
    bytes: Bytes,
}

impl TimestampBlock {
    /// Length of the canonical encoding: parent id, height, timestamp, and
    /// data hash, all fixed width.
    pub const ENCODED_LEN: usize = BlockId::SIZE + 8 + 8 + DataHash::SIZE;

    /// Build a block from its content, deriving bytes and id.
    pub fn new(parent: BlockId, height: u64, timestamp: i64, data_hash: DataHash) -> Self {
        let mut buf = BytesMut::with_capacity(Self::ENCODED_LEN);
        parent.write(&mut buf);
        height.write(&mut buf);
        timestamp.write(&mut buf);
        data_hash.write(&mut buf);
        let bytes = buf.freeze();
        let id = BlockId::of_bytes(&bytes);

        Self { parent, height, timestamp, data_hash, id, bytes }
    }

    /// The genesis block for a chain seeded with `data_hash`.
    pub fn genesis(data_hash: DataHash) -> Self {
        Self::new(BlockId::EMPTY, 0, 0, data_hash)
    }

    /// Parse a block from its canonical encoding.
    pub fn parse(bytes: &[u8]) -> Result<Self, ChainError> {
        let mut buf = bytes;
        let (parent, height, timestamp, data_hash) =
            Self::read_content(&mut buf).map_err(|err| ChainError::Parse(err.to_string()))?;
        if buf.has_remaining() {
            return Err(ChainError::Parse(format!("{} trailing bytes", buf.remaining())));
        }

        Ok(Self {
            parent,
            height,
            timestamp,
            data_hash,
            id: BlockId::of_bytes(bytes),
            bytes: Bytes::copy_from_slice(bytes),
        })
    }

    fn read_content(buf: &mut impl Buf) -> Result<(BlockId, u64, i64, DataHash), CodecError> {
        let parent = BlockId::read(buf)?;
        let height = u64::read(buf)?;
        let timestamp = i64::read(buf)?;
        let data_hash = DataHash::read(buf)?;
        Ok((parent, height, timestamp, data_hash))
    }

    /// The payload fingerprint this block timestamps.
    pub const fn data_hash(&self) -> DataHash {
        self.data_hash
    }
}

impl StatelessBlock for TimestampBlock {
    fn id(&self) -> BlockId {
        self.id
    }

    fn parent(&self) -> BlockId {
        self.parent
    }

    fn height(&self) -> u64 {
        self.height
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

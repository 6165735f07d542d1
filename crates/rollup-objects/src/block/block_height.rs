use core::{fmt, ops::Add};

use crate::utils::serde::{
    ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
};

// BLOCK HEIGHT
// ================================================================================================

/// A convenience wrapper around a `u64` representing the height of a block.
///
/// Each block has a unique height and heights increase monotonically by `1` starting at the
/// genesis block.
#[derive(Debug, Default, Eq, PartialEq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// The height of the genesis block.
    pub const GENESIS: Self = Self(0);

    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    /// Returns the previous block height
    pub fn parent(self) -> Option<BlockHeight> {
        self.0.checked_sub(1).map(Self)
    }

    /// Returns the next block height
    pub fn child(self) -> BlockHeight {
        self + 1
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the number of blocks between `other` and `self`, or zero if `other` is higher.
    pub fn saturating_distance(&self, other: BlockHeight) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

impl Add<u64> for BlockHeight {
    type Output = Self;

    fn add(self, other: u64) -> Self::Output {
        BlockHeight(self.0 + other)
    }
}

impl Serializable for BlockHeight {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u64(self.0);
    }

    fn get_size_hint(&self) -> usize {
        core::mem::size_of::<u64>()
    }
}

impl Deserializable for BlockHeight {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        source.read_u64().map(BlockHeight)
    }
}

impl From<u64> for BlockHeight {
    fn from(value: u64) -> Self {
        BlockHeight(value)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

use core::fmt;

use crate::utils::serde::{
    ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
};

// BLOCK STATUS
// ================================================================================================

/// Lifecycle status of a block.
///
/// Statuses only move forward one step at a time:
/// `Pending -> Committed -> Proved -> Executed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum BlockStatus {
    /// The block was sealed but its pubdata was not yet submitted to the base chain.
    Pending = 0,
    /// The block's pubdata was committed on the base chain.
    Committed = 1,
    /// A proof of the block was accepted by the base chain.
    Proved = 2,
    /// The block was finalized on the base chain.
    Executed = 3,
}

impl BlockStatus {
    /// Returns the status following this one, or `None` for [`BlockStatus::Executed`].
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Committed),
            Self::Committed => Some(Self::Proved),
            Self::Proved => Some(Self::Executed),
            Self::Executed => None,
        }
    }

    /// Returns true if `next` directly follows this status.
    pub fn can_transition_to(&self, next: BlockStatus) -> bool {
        self.next() == Some(next)
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Serializable for BlockStatus {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(*self as u8);
    }
}

impl Deserializable for BlockStatus {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        match source.read_u8()? {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Committed),
            2 => Ok(Self::Proved),
            3 => Ok(Self::Executed),
            status => {
                Err(DeserializationError::InvalidValue(format!("unknown block status {status}")))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(BlockStatus::Pending, BlockStatus::Committed, true)]
    #[case(BlockStatus::Committed, BlockStatus::Proved, true)]
    #[case(BlockStatus::Proved, BlockStatus::Executed, true)]
    #[case(BlockStatus::Pending, BlockStatus::Proved, false)]
    #[case(BlockStatus::Pending, BlockStatus::Executed, false)]
    #[case(BlockStatus::Proved, BlockStatus::Committed, false)]
    #[case(BlockStatus::Executed, BlockStatus::Executed, false)]
    fn status_transitions(
        #[case] from: BlockStatus,
        #[case] to: BlockStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }
}

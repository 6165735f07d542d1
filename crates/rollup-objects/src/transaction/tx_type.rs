use core::fmt;

use crate::utils::serde::{
    ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
};

// TRANSACTION TYPE
// ================================================================================================

/// Tag identifying a transaction variant in signing fields, pubdata and witnesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TxType {
    Empty = 0,
    Register = 1,
    CreatePair = 2,
    Deposit = 3,
    DepositNft = 4,
    Transfer = 5,
    Swap = 6,
    AddLiquidity = 7,
    RemoveLiquidity = 8,
    Withdraw = 9,
    CreateCollection = 10,
    MintNft = 11,
    TransferNft = 12,
    AtomicMatch = 13,
    CancelOffer = 14,
    WithdrawNft = 15,
    FullExit = 16,
    FullExitNft = 17,
}

impl TxType {
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Returns true for operations originating on the base chain. Priority operations are neither
    /// signed nor nonce-checked.
    pub const fn is_priority(&self) -> bool {
        matches!(
            self,
            Self::Register
                | Self::CreatePair
                | Self::Deposit
                | Self::DepositNft
                | Self::FullExit
                | Self::FullExitNft
        )
    }

    /// Returns true for operations the base chain must act upon once the block is executed.
    pub const fn is_onchain(&self) -> bool {
        matches!(self, Self::Withdraw | Self::WithdrawNft | Self::FullExit | Self::FullExitNft)
    }
}

impl TryFrom<u8> for TxType {
    type Error = DeserializationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Empty,
            1 => Self::Register,
            2 => Self::CreatePair,
            3 => Self::Deposit,
            4 => Self::DepositNft,
            5 => Self::Transfer,
            6 => Self::Swap,
            7 => Self::AddLiquidity,
            8 => Self::RemoveLiquidity,
            9 => Self::Withdraw,
            10 => Self::CreateCollection,
            11 => Self::MintNft,
            12 => Self::TransferNft,
            13 => Self::AtomicMatch,
            14 => Self::CancelOffer,
            15 => Self::WithdrawNft,
            16 => Self::FullExit,
            17 => Self::FullExitNft,
            _ => {
                return Err(DeserializationError::InvalidValue(format!(
                    "unknown transaction type {value}"
                )));
            },
        })
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Serializable for TxType {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(self.as_u8());
    }
}

impl Deserializable for TxType {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        TxType::try_from(source.read_u8()?)
    }
}

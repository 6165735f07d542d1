use rollup_objects::{
    block::BlockHeight, transaction::TransactionId, utils::serde::DeserializationError,
};
use rollup_tx::{RegistryError, VerifierError};
use thiserror::Error;

// BLOCK ASSEMBLER ERROR
// ================================================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlockAssemblerError {
    #[error(
        "block {height} is more than {max_height_lag} blocks ahead of the last persisted block \
         {persisted_height}"
    )]
    HeightLagExceeded {
        height: BlockHeight,
        persisted_height: BlockHeight,
        max_height_lag: u64,
    },
    #[error("block {height} already holds {capacity} transactions and must be sealed first")]
    BlockFull { height: BlockHeight, capacity: usize },
    #[error("block {0} is not tracked by the assembler")]
    UnknownBlock(BlockHeight),
}

// WITNESS ERROR
// ================================================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WitnessError {
    #[error("block {height} holds {count} transactions but the witness capacity is {capacity}")]
    TooManyTransactions {
        height: BlockHeight,
        count: usize,
        capacity: usize,
    },
    #[error("transaction {tx_id} has {count} signing fields which exceeds the witness layout")]
    TooManySigningFields { tx_id: TransactionId, count: usize },
    #[error("transaction {tx_id} touches {count} state entries which exceeds the witness layout")]
    TooManyStateTransitions { tx_id: TransactionId, count: usize },
}

// STORE ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("expected block {expected} to be appended next but got block {actual}")]
    NonSequentialBlock {
        expected: BlockHeight,
        actual: BlockHeight,
    },
    #[error("block {0} has not been stored")]
    UnknownBlock(BlockHeight),
    #[error("failed to decode stored block {height}: {error}")]
    CorruptBlock {
        height: BlockHeight,
        error: DeserializationError,
    },
}

// CONFIG ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load block producer configuration")]
    Load(#[source] Box<figment::Error>),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

// BLOCK PRODUCER ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum BlockProducerError {
    #[error("transaction was rejected")]
    Rejected(#[from] VerifierError),
    #[error("failed to apply a verified transaction to the account state")]
    Registry(#[from] RegistryError),
    #[error("block assembler refused the transaction")]
    Assembler(#[from] BlockAssemblerError),
    #[error("failed to export the witness of a sealed block")]
    Witness(#[from] WitnessError),
    #[error("failed to persist produced state")]
    Store(#[from] StoreError),
}

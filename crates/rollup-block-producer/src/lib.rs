mod assembler;
pub use assembler::{BlockAssembler, SealReason};

mod config;
pub use config::{BlockProducerConfig, ENV_PREFIX, RecancelPolicy};

mod errors;
pub use errors::{BlockAssemblerError, BlockProducerError, ConfigError, StoreError, WitnessError};

mod producer;
pub use producer::{BlockProducer, TxReceipt};

mod store;
pub use store::{AccountStore, BlockStore, MemoryStore};

mod witness;
pub use witness::{StateSlot, TxWitness, Witness, WitnessExporter};

#[cfg(test)]
mod tests;

/// Target of all log events emitted by this crate.
pub const ROLLUP_BLOCK_PRODUCER: &str = "rollup-block-producer";

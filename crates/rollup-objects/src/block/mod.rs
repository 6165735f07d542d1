use alloc::vec::Vec;

use miden_crypto::merkle::Smt;

use crate::{
    Digest, Hasher,
    elements::ElementWriter,
    transaction::ExecutedTransaction,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

mod block_height;
pub use block_height::BlockHeight;

mod status;
pub use status::BlockStatus;

// BLOCK
// ================================================================================================

/// A sealed rollup block.
///
/// A block consists of:
/// - Its height, and the state roots before and after its transactions were applied.
/// - The ordered list of executed transactions.
/// - `pending_operations_count`, the number of priority operations from the base chain the block
///   processes.
/// - `pending_onchain_operations_hash`, a hash chain over the pubdata of every operation the base
///   chain has to act upon (withdrawals and exits). The chain starts at the hash of the empty
///   byte string.
/// - A commitment binding all of the above together with the block's pubdata and timestamp.
/// - Its lifecycle status, which is not part of the commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    height: BlockHeight,
    commitment: Digest,
    prev_state_root: Digest,
    state_root: Digest,
    status: BlockStatus,
    transactions: Vec<ExecutedTransaction>,
    pending_operations_count: u64,
    pending_onchain_operations_hash: Digest,
    timestamp: u64,
}

impl Block {
    /// Returns a new pending block containing the provided transactions.
    pub fn new(
        height: BlockHeight,
        prev_state_root: Digest,
        state_root: Digest,
        transactions: Vec<ExecutedTransaction>,
        timestamp: u64,
    ) -> Self {
        let pending_operations_count =
            transactions.iter().filter(|tx| tx.tx().is_priority()).count() as u64;
        let pending_onchain_operations_hash = transactions
            .iter()
            .filter(|tx| tx.tx().is_onchain())
            .fold(empty_onchain_operations_hash(), |hash, tx| {
                Hasher::merge(&[hash, Hasher::hash(tx.pubdata())])
            });

        let mut block = Self {
            height,
            commitment: Digest::default(),
            prev_state_root,
            state_root,
            status: BlockStatus::Pending,
            transactions,
            pending_operations_count,
            pending_onchain_operations_hash,
            timestamp,
        };
        block.commitment = block.compute_commitment();
        block
    }

    /// Returns the genesis block, which is already executed and commits to the empty state.
    pub fn genesis() -> Self {
        let root = empty_state_root();
        let mut block = Self::new(BlockHeight::GENESIS, root, root, Vec::new(), 0);
        block.status = BlockStatus::Executed;
        block
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn commitment(&self) -> Digest {
        self.commitment
    }

    pub fn prev_state_root(&self) -> Digest {
        self.prev_state_root
    }

    pub fn state_root(&self) -> Digest {
        self.state_root
    }

    pub fn status(&self) -> BlockStatus {
        self.status
    }

    pub fn transactions(&self) -> &[ExecutedTransaction] {
        &self.transactions
    }

    pub fn pending_operations_count(&self) -> u64 {
        self.pending_operations_count
    }

    pub fn pending_onchain_operations_hash(&self) -> Digest {
        self.pending_onchain_operations_hash
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns the concatenated pubdata of all transactions in the block.
    pub fn pubdata(&self) -> Vec<u8> {
        self.transactions.iter().flat_map(|tx| tx.pubdata().iter().copied()).collect()
    }

    // STATE MUTATORS
    // --------------------------------------------------------------------------------------------

    /// Returns the block with the status recorded for it by persistent storage.
    ///
    /// Unlike [`Self::advance_status`] this does not check the transition.
    pub fn with_status(mut self, status: BlockStatus) -> Self {
        self.status = status;
        self
    }

    /// Moves the block to the next lifecycle status.
    ///
    /// # Panics
    /// Panics if `status` does not directly follow the current status. Skipping or reverting a
    /// status is a programming error.
    pub fn advance_status(&mut self, status: BlockStatus) {
        assert!(
            self.status.can_transition_to(status),
            "block {} cannot transition from {} to {}",
            self.height,
            self.status,
            status
        );
        self.status = status;
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn compute_commitment(&self) -> Digest {
        let mut writer = ElementWriter::new();
        writer
            .push_u64(self.height.as_u64())
            .push_u64(self.timestamp)
            .push_digest(self.prev_state_root)
            .push_digest(self.state_root)
            .push_digest(Hasher::hash(&self.pubdata()))
            .push_digest(self.pending_onchain_operations_hash)
            .push_u64(self.pending_operations_count);
        Hasher::hash_elements(writer.as_elements())
    }
}

impl Serializable for Block {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.height.write_into(target);
        self.prev_state_root.write_into(target);
        self.state_root.write_into(target);
        self.status.write_into(target);
        self.transactions.write_into(target);
        target.write_u64(self.timestamp);
        self.commitment.write_into(target);
    }
}

impl Deserializable for Block {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let height = source.read()?;
        let prev_state_root = source.read()?;
        let state_root = source.read()?;
        let status = source.read()?;
        let transactions = source.read()?;
        let timestamp = source.read_u64()?;
        let commitment: Digest = source.read()?;

        let mut block = Self::new(height, prev_state_root, state_root, transactions, timestamp);
        if block.commitment != commitment {
            return Err(DeserializationError::InvalidValue(format!(
                "commitment of block {height} does not match its contents"
            )));
        }
        block.status = status;
        Ok(block)
    }
}

// STATE ROOT
// ================================================================================================

/// Returns the state root committing to the account, pool and NFT trees.
pub fn compute_state_root(account_root: Digest, pool_root: Digest, nft_root: Digest) -> Digest {
    let mut writer = ElementWriter::new();
    writer.push_digest(account_root).push_digest(pool_root).push_digest(nft_root);
    Hasher::hash_elements(writer.as_elements())
}

/// Returns the state root of a rollup without any accounts, pools or NFTs.
pub fn empty_state_root() -> Digest {
    let empty_root = Smt::new().root();
    compute_state_root(empty_root, empty_root, empty_root)
}

/// Returns the initial value of the on-chain operations hash chain.
pub fn empty_onchain_operations_hash() -> Digest {
    Hasher::hash(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_block_is_executed_and_empty() {
        let genesis = Block::genesis();

        assert_eq!(genesis.height(), BlockHeight::GENESIS);
        assert_eq!(genesis.status(), BlockStatus::Executed);
        assert_eq!(genesis.state_root(), empty_state_root());
        assert_eq!(genesis.pending_onchain_operations_hash(), empty_onchain_operations_hash());
        assert_eq!(genesis.pending_operations_count(), 0);
    }

    #[test]
    fn block_serialization_preserves_commitment() {
        let mut block =
            Block::new(BlockHeight::new(1), empty_state_root(), Digest::default(), vec![], 7);
        block.advance_status(BlockStatus::Committed);

        let decoded = Block::read_from_bytes(&block.to_bytes()).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    #[should_panic(expected = "cannot transition from Pending to Proved")]
    fn skipping_a_status_panics() {
        let mut block =
            Block::new(BlockHeight::new(1), Digest::default(), Digest::default(), vec![], 0);
        block.advance_status(BlockStatus::Proved);
    }
}

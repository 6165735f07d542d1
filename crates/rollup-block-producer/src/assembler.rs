use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use rollup_objects::{
    Digest,
    block::{Block, BlockHeight, BlockStatus},
    transaction::ExecutedTransaction,
};
use tracing::{info, warn};

use crate::{BlockAssemblerError, BlockProducerConfig, ROLLUP_BLOCK_PRODUCER};

// SEAL REASON
// ================================================================================================

/// Why the open block is ready to be sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealReason {
    /// The block holds as many transactions as it can.
    Capacity,
    /// The oldest transaction of the block waited for longer than the seal timeout.
    Timeout,
}

// BLOCK ASSEMBLER
// ================================================================================================

/// A sealed block whose lifecycle is still being followed.
#[derive(Debug, Clone)]
struct TrackedBlock {
    block: Block,
    /// When the block entered its current status.
    status_since: Instant,
    stalled: bool,
}

/// Collects executed transactions into blocks and follows sealed blocks through their lifecycle.
///
/// There is a single open block at any time. It is sealed once it is full or its oldest
/// transaction waited for longer than the seal timeout; a block without transactions is never
/// sealed. The next block is opened as soon as the previous one is sealed, but transactions are
/// only admitted while the open block is at most `max_height_lag` blocks ahead of the last
/// persisted block.
///
/// Sealed blocks are tracked until they are executed. All durations are measured with the
/// monotonic [`Instant`] provided by the caller.
#[derive(Debug, Clone)]
pub struct BlockAssembler {
    block_capacity: usize,
    seal_timeout: Duration,
    stall_timeout: Duration,
    max_height_lag: u64,
    next_height: BlockHeight,
    prev_state_root: Digest,
    transactions: Vec<ExecutedTransaction>,
    oldest_tx_at: Option<Instant>,
    persisted_height: BlockHeight,
    blocks: BTreeMap<BlockHeight, TrackedBlock>,
}

impl BlockAssembler {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns an assembler building on top of `last_block`, which is assumed to be persisted.
    ///
    /// Unless `last_block` is already executed its lifecycle is tracked from `now` on.
    pub fn new(config: &BlockProducerConfig, last_block: Block, now: Instant) -> Self {
        let mut blocks = BTreeMap::new();
        let height = last_block.height();
        let prev_state_root = last_block.state_root();
        if last_block.status() != BlockStatus::Executed {
            blocks.insert(
                height,
                TrackedBlock { block: last_block, status_since: now, stalled: false },
            );
        }

        Self {
            block_capacity: config.block_capacity,
            seal_timeout: config.seal_timeout(),
            stall_timeout: config.stall_timeout(),
            max_height_lag: config.max_height_lag,
            next_height: height.child(),
            prev_state_root,
            transactions: Vec::new(),
            oldest_tx_at: None,
            persisted_height: height,
            blocks,
        }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the height of the open block.
    pub fn next_height(&self) -> BlockHeight {
        self.next_height
    }

    /// Returns the state root the open block builds on.
    pub fn prev_state_root(&self) -> Digest {
        self.prev_state_root
    }

    pub fn persisted_height(&self) -> BlockHeight {
        self.persisted_height
    }

    pub fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    /// Returns the transactions of the open block.
    pub fn pending_transactions(&self) -> &[ExecutedTransaction] {
        &self.transactions
    }

    /// Returns a sealed block which has not been executed yet.
    pub fn block(&self, height: BlockHeight) -> Option<&Block> {
        self.blocks.get(&height).map(|tracked| &tracked.block)
    }

    /// Returns the heights of all blocks currently flagged as stalled.
    pub fn stalled_blocks(&self) -> impl Iterator<Item = BlockHeight> + '_ {
        self.blocks.values().filter(|tracked| tracked.stalled).map(|t| t.block.height())
    }

    /// Checks whether a transaction could be added to the open block.
    ///
    /// # Errors
    /// Returns an error if the open block is full, or if it is too far ahead of the last
    /// persisted block.
    pub fn check_admission(&self) -> Result<(), BlockAssemblerError> {
        if self.transactions.len() >= self.block_capacity {
            return Err(BlockAssemblerError::BlockFull {
                height: self.next_height,
                capacity: self.block_capacity,
            });
        }
        if self.next_height.saturating_distance(self.persisted_height) > self.max_height_lag {
            return Err(BlockAssemblerError::HeightLagExceeded {
                height: self.next_height,
                persisted_height: self.persisted_height,
                max_height_lag: self.max_height_lag,
            });
        }
        Ok(())
    }

    /// Returns the reason the open block should be sealed at `now`, or `None` if it should stay
    /// open.
    pub fn seal_reason(&self, now: Instant) -> Option<SealReason> {
        let oldest_tx_at = self.oldest_tx_at?;
        if self.transactions.len() >= self.block_capacity {
            Some(SealReason::Capacity)
        } else if now.saturating_duration_since(oldest_tx_at) >= self.seal_timeout {
            Some(SealReason::Timeout)
        } else {
            None
        }
    }

    // STATE MUTATORS
    // --------------------------------------------------------------------------------------------

    /// Appends a transaction to the open block and returns its position within the block.
    ///
    /// # Errors
    /// Returns an error if the transaction is not admitted. See [`Self::check_admission`].
    pub fn push(
        &mut self,
        tx: ExecutedTransaction,
        now: Instant,
    ) -> Result<usize, BlockAssemblerError> {
        self.check_admission()?;
        self.oldest_tx_at.get_or_insert(now);
        self.transactions.push(tx);
        Ok(self.transactions.len() - 1)
    }

    /// Seals the open block with the state root reached after its last transaction.
    ///
    /// Returns `None` without opening a new block if the open block has no transactions.
    pub fn seal(&mut self, state_root: Digest, timestamp: u64, now: Instant) -> Option<Block> {
        self.oldest_tx_at.take()?;
        let transactions = core::mem::take(&mut self.transactions);
        let block =
            Block::new(self.next_height, self.prev_state_root, state_root, transactions, timestamp);

        info!(
            target: ROLLUP_BLOCK_PRODUCER,
            height = %block.height(),
            commitment = %block.commitment().to_hex(),
            transactions = block.transactions().len(),
            "Sealed block"
        );

        self.blocks.insert(
            block.height(),
            TrackedBlock { block: block.clone(), status_since: now, stalled: false },
        );
        self.prev_state_root = state_root;
        self.next_height = self.next_height.child();
        Some(block)
    }

    /// Records that the block at `height` was persisted, which lets the assembler move ahead.
    pub fn mark_persisted(&mut self, height: BlockHeight) {
        self.persisted_height = self.persisted_height.max(height);
    }

    /// Records that the pubdata of the block at `height` was committed on the base chain.
    ///
    /// # Errors
    /// Returns an error if the block is not tracked.
    ///
    /// # Panics
    /// Panics if the block is not pending.
    pub fn mark_committed(
        &mut self,
        height: BlockHeight,
        now: Instant,
    ) -> Result<(), BlockAssemblerError> {
        self.advance(height, BlockStatus::Committed, now)
    }

    /// Records that a proof of the block at `height` was accepted.
    ///
    /// # Errors
    /// Returns an error if the block is not tracked.
    ///
    /// # Panics
    /// Panics if the block is not committed.
    pub fn mark_proved(
        &mut self,
        height: BlockHeight,
        now: Instant,
    ) -> Result<(), BlockAssemblerError> {
        self.advance(height, BlockStatus::Proved, now)
    }

    /// Records that the block at `height` was finalized and stops tracking it.
    ///
    /// # Errors
    /// Returns an error if the block is not tracked.
    ///
    /// # Panics
    /// Panics if the block is not proved.
    pub fn mark_executed(
        &mut self,
        height: BlockHeight,
        now: Instant,
    ) -> Result<(), BlockAssemblerError> {
        self.advance(height, BlockStatus::Executed, now)?;
        self.blocks.remove(&height);
        Ok(())
    }

    /// Flags every committed block which has been waiting for its proof for longer than the
    /// stall timeout, and returns the heights of the blocks flagged by this call.
    ///
    /// Stalled blocks are only reported. Regenerating the proof is left to the prover.
    pub fn detect_stalls(&mut self, now: Instant) -> Vec<BlockHeight> {
        let mut stalled = Vec::new();
        for tracked in self.blocks.values_mut() {
            if tracked.stalled || tracked.block.status() != BlockStatus::Committed {
                continue;
            }
            let waiting = now.saturating_duration_since(tracked.status_since);
            if waiting > self.stall_timeout {
                warn!(
                    target: ROLLUP_BLOCK_PRODUCER,
                    height = %tracked.block.height(),
                    waiting_secs = waiting.as_secs(),
                    "Block is stalled waiting for its proof"
                );
                tracked.stalled = true;
                stalled.push(tracked.block.height());
            }
        }
        stalled
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn advance(
        &mut self,
        height: BlockHeight,
        status: BlockStatus,
        now: Instant,
    ) -> Result<(), BlockAssemblerError> {
        let tracked =
            self.blocks.get_mut(&height).ok_or(BlockAssemblerError::UnknownBlock(height))?;
        tracked.block.advance_status(status);
        tracked.status_since = now;
        tracked.stalled = false;

        info!(target: ROLLUP_BLOCK_PRODUCER, %height, %status, "Block status changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rollup_objects::{
        account::{AccountIndex, AssetId, account_name_hash},
        transaction::{DepositTx, TransactionInfo, VerifiedTransaction},
    };

    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn config(block_capacity: usize, max_height_lag: u64) -> BlockProducerConfig {
        BlockProducerConfig {
            block_capacity,
            max_height_lag,
            ..Default::default()
        }
    }

    fn deposit(amount: u32) -> ExecutedTransaction {
        let tx = TransactionInfo::Deposit(DepositTx {
            account_index: AccountIndex::new(0),
            account_name_hash: account_name_hash("alice"),
            asset_id: AssetId::new(0),
            amount: amount.into(),
        });
        ExecutedTransaction::new(VerifiedTransaction::new(tx, vec![], vec![]), vec![], None)
    }

    #[test]
    fn seals_when_full() -> anyhow::Result<()> {
        let now = Instant::now();
        let mut assembler = BlockAssembler::new(&config(2, 10), Block::genesis(), now);

        assembler.push(deposit(1), now)?;
        assert_eq!(assembler.seal_reason(now), None);
        assert_eq!(assembler.push(deposit(2), now)?, 1);
        assert_eq!(assembler.seal_reason(now), Some(SealReason::Capacity));
        assert_matches!(
            assembler.push(deposit(3), now),
            Err(BlockAssemblerError::BlockFull { .. })
        );

        let block = assembler.seal(Digest::default(), 1, now).expect("block should be sealed");
        assert_eq!(block.height(), BlockHeight::new(1));
        assert_eq!(block.prev_state_root(), Block::genesis().state_root());
        assert_eq!(block.transactions().len(), 2);
        assert_eq!(block.pending_operations_count(), 2);
        assert_eq!(assembler.next_height(), BlockHeight::new(2));
        assert_eq!(assembler.prev_state_root(), Digest::default());
        Ok(())
    }

    #[test]
    fn empty_blocks_are_never_sealed() {
        let now = Instant::now();
        let mut assembler = BlockAssembler::new(&config(2, 10), Block::genesis(), now);

        assert_eq!(assembler.seal_reason(now + 60 * MINUTE), None);
        assert!(assembler.seal(Digest::default(), 0, now).is_none());
        assert_eq!(assembler.next_height(), BlockHeight::new(1));
    }

    #[test]
    fn timeout_counts_from_the_oldest_transaction() -> anyhow::Result<()> {
        let start = Instant::now();
        let mut assembler = BlockAssembler::new(&config(50, 10), Block::genesis(), start);

        assembler.push(deposit(1), start)?;
        assembler.push(deposit(2), start + 5 * MINUTE)?;
        assert_eq!(assembler.seal_reason(start + 9 * MINUTE), None);
        assert_eq!(assembler.seal_reason(start + 10 * MINUTE), Some(SealReason::Timeout));
        Ok(())
    }

    #[test]
    fn admission_is_bounded_by_persisted_height() -> anyhow::Result<()> {
        let now = Instant::now();
        let mut assembler = BlockAssembler::new(&config(1, 2), Block::genesis(), now);

        for timestamp in 0..2 {
            assembler.push(deposit(1), now)?;
            assembler.seal(Digest::default(), timestamp, now);
        }
        assert_matches!(
            assembler.push(deposit(1), now),
            Err(BlockAssemblerError::HeightLagExceeded { max_height_lag: 2, .. })
        );

        assembler.mark_persisted(BlockHeight::new(1));
        assembler.push(deposit(1), now)?;
        Ok(())
    }

    #[test]
    fn lifecycle_and_stall_detection() -> anyhow::Result<()> {
        let start = Instant::now();
        let mut assembler = BlockAssembler::new(&config(1, 10), Block::genesis(), start);
        assembler.push(deposit(1), start)?;
        let height = assembler.seal(Digest::default(), 0, start).expect("sealed").height();

        // pending blocks never stall
        assert!(assembler.detect_stalls(start + 60 * MINUTE).is_empty());

        assembler.mark_committed(height, start)?;
        assert!(assembler.detect_stalls(start + 10 * MINUTE).is_empty());
        assert_eq!(assembler.detect_stalls(start + 11 * MINUTE), vec![height]);
        // a stalled block is reported once
        assert!(assembler.detect_stalls(start + 20 * MINUTE).is_empty());
        assert_eq!(assembler.stalled_blocks().collect::<Vec<_>>(), vec![height]);

        assembler.mark_proved(height, start + 21 * MINUTE)?;
        assert_eq!(assembler.stalled_blocks().count(), 0);
        assembler.mark_executed(height, start + 22 * MINUTE)?;
        assert!(assembler.block(height).is_none());
        assert_matches!(
            assembler.mark_executed(height, start),
            Err(BlockAssemblerError::UnknownBlock(_))
        );
        Ok(())
    }

    #[test]
    #[should_panic(expected = "cannot transition from Pending to Proved")]
    fn skipping_committed_panics() {
        let now = Instant::now();
        let mut assembler = BlockAssembler::new(&config(1, 10), Block::genesis(), now);
        assembler.push(deposit(1), now).unwrap();
        let height = assembler.seal(Digest::default(), 0, now).unwrap().height();

        let _ = assembler.mark_proved(height, now);
    }
}

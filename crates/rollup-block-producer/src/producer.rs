use std::{collections::VecDeque, time::Instant};

use rayon::prelude::*;
use rollup_objects::{
    Digest,
    block::{Block, BlockHeight, BlockStatus},
    transaction::{Footprint, TransactionId, TransactionInfo, TxDetail, VerifiedTransaction},
};
use rollup_tx::{
    AccountStateRegistry, DirtyState, RpoFalcon512Scheme, SignatureScheme, StateSnapshot,
    TransactionVerifier, VerifierError,
};
use tracing::{info, instrument};

use crate::{
    AccountStore, BlockAssembler, BlockProducerConfig, BlockProducerError, BlockStore,
    ROLLUP_BLOCK_PRODUCER, SealReason, Witness, WitnessExporter,
};

// TRANSACTION RECEIPT
// ================================================================================================

/// The outcome of a transaction accepted by the block producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_id: TransactionId,
    /// Height of the block the transaction was included in.
    pub block_height: BlockHeight,
    /// Position of the transaction within its block.
    pub position: usize,
    /// The ordered state changes of the transaction.
    pub details: Vec<TxDetail>,
}

// BLOCK PRODUCER
// ================================================================================================

/// A sealed block which has not been written to persistent storage yet, together with the state
/// changed up to and including the block.
#[derive(Debug, Clone)]
struct UnpersistedBlock {
    block: Block,
    state: DirtyState,
}

/// Turns submitted transactions into sealed blocks and their witnesses.
///
/// The producer is the single writer of the account state: transactions are verified against
/// snapshots of the registry, possibly in parallel, but are applied to it strictly one at a time
/// in submission order. Sealed blocks and the state they produced are queued until
/// [`Self::persist`] writes them out, and their witnesses are queued until the prover collects
/// them through [`Self::take_witnesses`].
pub struct BlockProducer<S: SignatureScheme = RpoFalcon512Scheme> {
    verifier: TransactionVerifier<S>,
    registry: AccountStateRegistry,
    assembler: BlockAssembler,
    exporter: WitnessExporter,
    unpersisted: VecDeque<UnpersistedBlock>,
    status_updates: VecDeque<(BlockHeight, BlockStatus)>,
    witnesses: VecDeque<Witness>,
}

impl<S: SignatureScheme> BlockProducer<S> {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Returns a producer continuing from `last_block`, whose post-state `registry` holds.
    pub fn new(
        config: &BlockProducerConfig,
        scheme: S,
        registry: AccountStateRegistry,
        last_block: Block,
        now: Instant,
    ) -> Self {
        Self {
            verifier: TransactionVerifier::new(scheme, config.verifier_config()),
            registry,
            assembler: BlockAssembler::new(config, last_block, now),
            exporter: WitnessExporter::new(config.block_capacity),
            unpersisted: VecDeque::new(),
            status_updates: VecDeque::new(),
            witnesses: VecDeque::new(),
        }
    }

    /// Returns a producer continuing from the state and the latest block found in `store`.
    ///
    /// An empty store is initialized with the genesis block.
    ///
    /// # Errors
    /// Returns an error if reading from or writing to the store fails.
    pub fn from_store<St: AccountStore + BlockStore>(
        config: &BlockProducerConfig,
        scheme: S,
        store: &mut St,
        now: Instant,
    ) -> Result<Self, BlockProducerError> {
        let last_block = match store.latest_block()? {
            Some(block) => block,
            None => {
                let genesis = Block::genesis();
                store.append_block(&genesis)?;
                genesis
            },
        };
        let state = store.load_state()?;
        let registry = AccountStateRegistry::from_state(state.accounts, state.pools, state.nfts);

        info!(
            target: ROLLUP_BLOCK_PRODUCER,
            height = %last_block.height(),
            accounts = registry.num_accounts(),
            "Loaded block producer state"
        );
        Ok(Self::new(config, scheme, registry, last_block, now))
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn registry(&self) -> &AccountStateRegistry {
        &self.registry
    }

    pub fn assembler(&self) -> &BlockAssembler {
        &self.assembler
    }

    pub fn state_root(&self) -> Digest {
        self.registry.state_root()
    }

    /// Returns the heights of blocks which were reported as stalled and have not been proved
    /// since.
    pub fn stalled_blocks(&self) -> Vec<BlockHeight> {
        self.assembler.stalled_blocks().collect()
    }

    // TRANSACTION SUBMISSION
    // --------------------------------------------------------------------------------------------

    /// Verifies a transaction, applies it to the account state and adds it to the open block.
    ///
    /// The open block is sealed as soon as it is full. `timestamp` is the wall-clock time
    /// recorded in the header of a block sealed by this call.
    ///
    /// # Errors
    /// Returns an error if the open block admits no more transactions or the transaction is
    /// rejected. A rejected transaction leaves all state unchanged.
    #[instrument(target = ROLLUP_BLOCK_PRODUCER, skip_all, fields(tx_type = %tx.tx_type()), err)]
    pub fn submit(
        &mut self,
        tx: TransactionInfo,
        now: Instant,
        timestamp: u64,
    ) -> Result<TxReceipt, BlockProducerError> {
        self.assembler.check_admission()?;
        let snapshot = self.registry.snapshot_for(&tx);
        let verified = self.verifier.verify(&snapshot, &tx)?;
        self.commit(verified, now, timestamp)
    }

    /// Submits a batch of transactions and returns one result per transaction, in order.
    ///
    /// Runs of transactions which do not touch each other's state are verified in parallel
    /// against the same state. Accepted transactions are applied in batch order, so the outcome
    /// is the same as submitting the transactions one by one.
    #[instrument(target = ROLLUP_BLOCK_PRODUCER, skip_all, fields(txs = txs.len()))]
    pub fn submit_batch(
        &mut self,
        txs: &[TransactionInfo],
        now: Instant,
        timestamp: u64,
    ) -> Vec<Result<TxReceipt, BlockProducerError>> {
        let mut results = Vec::with_capacity(txs.len());
        for group in independent_runs(txs) {
            let snapshots: Vec<StateSnapshot> =
                group.iter().map(|tx| self.registry.snapshot_for(tx)).collect();
            let verifier = &self.verifier;
            let verified: Vec<Result<VerifiedTransaction, VerifierError>> = group
                .par_iter()
                .zip(snapshots.par_iter())
                .map(|(tx, snapshot)| verifier.verify(snapshot, tx))
                .collect();

            for result in verified {
                let receipt = match result {
                    Ok(verified) => self.commit(verified, now, timestamp),
                    Err(err) => Err(err.into()),
                };
                results.push(receipt);
            }
        }
        results
    }

    // BLOCK LIFECYCLE
    // --------------------------------------------------------------------------------------------

    /// Seals the open block if its oldest transaction timed out, and flags stalled blocks.
    ///
    /// Returns the height of the block sealed by this call, if any.
    ///
    /// # Errors
    /// Returns an error if the witness of the sealed block cannot be exported.
    #[instrument(target = ROLLUP_BLOCK_PRODUCER, skip_all, err)]
    pub fn tick(
        &mut self,
        now: Instant,
        timestamp: u64,
    ) -> Result<Option<BlockHeight>, BlockProducerError> {
        let sealed = match self.assembler.seal_reason(now) {
            Some(_) => self.seal(timestamp, now)?,
            None => None,
        };
        self.assembler.detect_stalls(now);
        Ok(sealed)
    }

    /// Returns the witnesses of all blocks sealed since the last call, in height order.
    pub fn take_witnesses(&mut self) -> Vec<Witness> {
        self.witnesses.drain(..).collect()
    }

    /// Writes sealed blocks, the state they produced and pending status changes to `store`.
    ///
    /// Returns the height of the latest block written by this call, if any. Once a block is
    /// persisted the assembler may move further ahead.
    ///
    /// # Errors
    /// Returns an error if writing to the store fails. Whatever was not written is retried by
    /// the next call.
    #[instrument(target = ROLLUP_BLOCK_PRODUCER, skip_all, err)]
    pub fn persist<St: AccountStore + BlockStore>(
        &mut self,
        store: &mut St,
    ) -> Result<Option<BlockHeight>, BlockProducerError> {
        let mut persisted = None;
        while let Some(entry) = self.unpersisted.front() {
            store.upsert_state(&entry.state)?;
            store.append_block(&entry.block)?;

            let height = entry.block.height();
            self.assembler.mark_persisted(height);
            self.unpersisted.pop_front();
            persisted = Some(height);
            info!(target: ROLLUP_BLOCK_PRODUCER, %height, "Persisted block");
        }

        while let Some(&(height, status)) = self.status_updates.front() {
            store.update_status(height, status)?;
            self.status_updates.pop_front();
        }
        Ok(persisted)
    }

    /// Records that the pubdata of the block at `height` was committed on the base chain.
    ///
    /// # Panics
    /// Panics if the block is not pending.
    pub fn block_committed(
        &mut self,
        height: BlockHeight,
        now: Instant,
    ) -> Result<(), BlockProducerError> {
        self.assembler.mark_committed(height, now)?;
        self.status_updates.push_back((height, BlockStatus::Committed));
        Ok(())
    }

    /// Records that a proof of the block at `height` was accepted.
    ///
    /// # Panics
    /// Panics if the block is not committed.
    pub fn block_proved(
        &mut self,
        height: BlockHeight,
        now: Instant,
    ) -> Result<(), BlockProducerError> {
        self.assembler.mark_proved(height, now)?;
        self.status_updates.push_back((height, BlockStatus::Proved));
        Ok(())
    }

    /// Records that the block at `height` was finalized on the base chain.
    ///
    /// # Panics
    /// Panics if the block is not proved.
    pub fn block_executed(
        &mut self,
        height: BlockHeight,
        now: Instant,
    ) -> Result<(), BlockProducerError> {
        self.assembler.mark_executed(height, now)?;
        self.status_updates.push_back((height, BlockStatus::Executed));
        Ok(())
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    /// Applies a verified transaction and appends it to the open block, sealing the block if it
    /// became full.
    fn commit(
        &mut self,
        verified: VerifiedTransaction,
        now: Instant,
        timestamp: u64,
    ) -> Result<TxReceipt, BlockProducerError> {
        self.assembler.check_admission()?;
        let executed = self.registry.apply_transaction(&verified)?;
        let tx_id = executed.id();
        let details = executed.details().to_vec();
        let block_height = self.assembler.next_height();
        let position = self.assembler.push(executed, now)?;

        if self.assembler.seal_reason(now) == Some(SealReason::Capacity) {
            self.seal(timestamp, now)?;
        }
        Ok(TxReceipt { tx_id, block_height, position, details })
    }

    fn seal(
        &mut self,
        timestamp: u64,
        now: Instant,
    ) -> Result<Option<BlockHeight>, BlockProducerError> {
        let Some(block) = self.assembler.seal(self.registry.state_root(), timestamp, now) else {
            return Ok(None);
        };
        let height = block.height();
        let witness = self.exporter.export(&block);
        self.unpersisted.push_back(UnpersistedBlock {
            block,
            state: self.registry.take_dirty_state(),
        });
        self.witnesses.push_back(witness?);
        Ok(Some(height))
    }
}

/// Splits `txs` into consecutive runs whose transactions can be verified against the same state.
///
/// A transaction whose footprint is incomplete always forms a run of its own.
fn independent_runs(txs: &[TransactionInfo]) -> Vec<&[TransactionInfo]> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut footprints: Vec<Footprint> = Vec::new();
    for (index, tx) in txs.iter().enumerate() {
        let footprint = tx.footprint();
        let dependent = !footprint.complete
            || footprints
                .iter()
                .any(|other| !other.complete || other.conflicts_with(&footprint));
        if dependent && index > start {
            runs.push(&txs[start..index]);
            start = index;
            footprints.clear();
        }
        footprints.push(footprint);
    }
    if start < txs.len() {
        runs.push(&txs[start..]);
    }
    runs
}

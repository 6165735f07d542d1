use rollup_objects::{
    Digest, ElementWriter, Felt, MAX_DETAILS_PER_TX, MAX_TX_FIELDS, STATE_VALUE_WIDTH, StarkField,
    ZERO,
    block::{Block, BlockHeight},
    transaction::{ExecutedTransaction, NonceTransition, StateTransition, TxType},
    utils::serde::{ByteWriter, Serializable},
};
use tracing::debug;

use crate::{ROLLUP_BLOCK_PRODUCER, WitnessError};

// STATE SLOT
// ================================================================================================

/// One state entry touched by a transaction, laid out as its key followed by the value before
/// and after the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSlot {
    key: [Felt; Self::KEY_WIDTH],
    pre: [Felt; STATE_VALUE_WIDTH],
    post: [Felt; STATE_VALUE_WIDTH],
}

impl StateSlot {
    /// Number of elements encoding the key: asset type, primary key and secondary key.
    pub const KEY_WIDTH: usize = 3;

    /// Number of elements of one slot.
    pub const WIDTH: usize = Self::KEY_WIDTH + 2 * STATE_VALUE_WIDTH;

    /// Returns an unused slot. All of its elements are zero.
    pub fn empty() -> Self {
        Self {
            key: [ZERO; Self::KEY_WIDTH],
            pre: [ZERO; STATE_VALUE_WIDTH],
            post: [ZERO; STATE_VALUE_WIDTH],
        }
    }

    pub fn key(&self) -> &[Felt] {
        &self.key
    }

    pub fn pre(&self) -> &[Felt] {
        &self.pre
    }

    pub fn post(&self) -> &[Felt] {
        &self.post
    }

    pub fn write_elements(&self, writer: &mut ElementWriter) {
        for element in self.key.iter().chain(&self.pre).chain(&self.post) {
            writer.push_felt(*element);
        }
    }
}

impl From<&StateTransition> for StateSlot {
    fn from(transition: &StateTransition) -> Self {
        let mut key = ElementWriter::new();
        transition.key.write_elements(&mut key);
        let mut pre = ElementWriter::new();
        transition.pre.write_elements(&mut pre);
        let mut post = ElementWriter::new();
        transition.post.write_elements(&mut post);

        let mut slot = Self::empty();
        for (target, source) in [
            (&mut slot.key[..], &key),
            (&mut slot.pre[..], &pre),
            (&mut slot.post[..], &post),
        ] {
            for (element, value) in target.iter_mut().zip(source.as_elements()) {
                *element = *value;
            }
        }
        slot
    }
}

// TRANSACTION WITNESS
// ================================================================================================

/// The fixed-width witness of one transaction.
///
/// The layout is:
/// - the transaction type tag (1 element).
/// - the nonce transition of the originating account: index, nonce before and after (5 elements).
/// - the signing fields, zero-padded to [`MAX_TX_FIELDS`] elements.
/// - [`MAX_DETAILS_PER_TX`] state slots in detail order, unused slots being empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxWitness {
    tx_type: TxType,
    nonce_transition: Option<NonceTransition>,
    fields: Vec<Felt>,
    slots: Vec<StateSlot>,
}

impl TxWitness {
    /// Number of elements of one transaction witness.
    pub const WIDTH: usize = 1 + 5 + MAX_TX_FIELDS + MAX_DETAILS_PER_TX * StateSlot::WIDTH;

    /// Returns the no-op witness used to pad blocks to their capacity.
    pub fn empty() -> Self {
        Self {
            tx_type: TxType::Empty,
            nonce_transition: None,
            fields: vec![ZERO; MAX_TX_FIELDS],
            slots: vec![StateSlot::empty(); MAX_DETAILS_PER_TX],
        }
    }

    /// Returns the witness of an executed transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction has more signing fields or touches more state entries
    /// than the layout has room for.
    pub fn from_executed(tx: &ExecutedTransaction) -> Result<Self, WitnessError> {
        let mut fields = tx.tx().signing_fields();
        if fields.len() > MAX_TX_FIELDS {
            return Err(WitnessError::TooManySigningFields { tx_id: tx.id(), count: fields.len() });
        }
        if tx.transitions().len() > MAX_DETAILS_PER_TX {
            return Err(WitnessError::TooManyStateTransitions {
                tx_id: tx.id(),
                count: tx.transitions().len(),
            });
        }
        fields.pad_to(MAX_TX_FIELDS);

        let mut slots: Vec<StateSlot> = tx.transitions().iter().map(StateSlot::from).collect();
        slots.resize(MAX_DETAILS_PER_TX, StateSlot::empty());

        Ok(Self {
            tx_type: tx.tx().tx_type(),
            nonce_transition: tx.nonce_transition(),
            fields: fields.into_elements(),
            slots,
        })
    }

    pub fn tx_type(&self) -> TxType {
        self.tx_type
    }

    pub fn nonce_transition(&self) -> Option<NonceTransition> {
        self.nonce_transition
    }

    pub fn fields(&self) -> &[Felt] {
        &self.fields
    }

    pub fn slots(&self) -> &[StateSlot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.tx_type == TxType::Empty
    }

    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer.push_u32(self.tx_type.as_u8() as u32);
        match self.nonce_transition {
            Some(transition) => writer
                .push_u32(transition.account_index.as_u32())
                .push_u64(transition.before)
                .push_u64(transition.after),
            None => writer.push_u32(0).push_u64(0).push_u64(0),
        };
        for field in &self.fields {
            writer.push_felt(*field);
        }
        for slot in &self.slots {
            slot.write_elements(writer);
        }
    }
}

// WITNESS
// ================================================================================================

/// The input of the proving circuit for one sealed block.
///
/// A witness always holds exactly `capacity` transaction witnesses: the transactions of the
/// block in block order followed by empty entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    height: BlockHeight,
    capacity: usize,
    prev_state_root: Digest,
    state_root: Digest,
    commitment: Digest,
    pending_operations_count: u64,
    transactions: Vec<TxWitness>,
}

impl Witness {
    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn prev_state_root(&self) -> Digest {
        self.prev_state_root
    }

    pub fn state_root(&self) -> Digest {
        self.state_root
    }

    pub fn commitment(&self) -> Digest {
        self.commitment
    }

    pub fn pending_operations_count(&self) -> u64 {
        self.pending_operations_count
    }

    pub fn transactions(&self) -> &[TxWitness] {
        &self.transactions
    }

    /// Returns the number of entries which are not padding.
    pub fn num_transactions(&self) -> usize {
        self.transactions.iter().filter(|tx| !tx.is_empty()).count()
    }

    /// Returns the witness flattened into field elements: the block header followed by every
    /// transaction witness.
    pub fn to_elements(&self) -> Vec<Felt> {
        let mut writer = ElementWriter::new();
        writer
            .push_u64(self.height.as_u64())
            .push_u64(self.capacity as u64)
            .push_digest(self.prev_state_root)
            .push_digest(self.state_root)
            .push_digest(self.commitment)
            .push_u64(self.pending_operations_count);
        for tx in &self.transactions {
            tx.write_elements(&mut writer);
        }
        writer.into_elements()
    }
}

impl Serializable for Witness {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        for element in self.to_elements() {
            target.write_u64(element.as_int());
        }
    }
}

// WITNESS EXPORTER
// ================================================================================================

/// Converts sealed blocks into fixed-size circuit inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WitnessExporter {
    capacity: usize,
}

impl WitnessExporter {
    /// Returns an exporter padding every witness to `capacity` transactions.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the witness of `block`.
    ///
    /// Exporting the same block twice yields identical witnesses.
    ///
    /// # Errors
    /// Returns an error if the block holds more transactions than the capacity, or if one of its
    /// transactions does not fit the layout of a [`TxWitness`].
    pub fn export(&self, block: &Block) -> Result<Witness, WitnessError> {
        let count = block.transactions().len();
        if count > self.capacity {
            return Err(WitnessError::TooManyTransactions {
                height: block.height(),
                count,
                capacity: self.capacity,
            });
        }

        let mut transactions = block
            .transactions()
            .iter()
            .map(TxWitness::from_executed)
            .collect::<Result<Vec<_>, _>>()?;
        transactions.resize(self.capacity, TxWitness::empty());

        debug!(
            target: ROLLUP_BLOCK_PRODUCER,
            height = %block.height(),
            transactions = count,
            padding = self.capacity - count,
            "Exported block witness"
        );

        Ok(Witness {
            height: block.height(),
            capacity: self.capacity,
            prev_state_root: block.prev_state_root(),
            state_root: block.state_root(),
            commitment: block.commitment(),
            pending_operations_count: block.pending_operations_count(),
            transactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rollup_objects::{
        account::{AccountIndex, NftIndex, account_name_hash},
        transaction::{FullExitNftTx, TransactionInfo, VerifiedTransaction},
    };

    use super::*;

    fn exit_nft(nft_index: u64) -> ExecutedTransaction {
        let tx = TransactionInfo::FullExitNft(FullExitNftTx {
            account_index: AccountIndex::new(3),
            account_name_hash: account_name_hash("carol"),
            nft_index: NftIndex::new_unchecked(nft_index),
        });
        ExecutedTransaction::new(VerifiedTransaction::new(tx, vec![], vec![]), vec![], None)
    }

    fn block(transactions: Vec<ExecutedTransaction>) -> Block {
        let genesis = Block::genesis();
        Block::new(BlockHeight::new(1), genesis.state_root(), genesis.state_root(), transactions, 9)
    }

    #[test]
    fn witness_is_padded_to_capacity() -> anyhow::Result<()> {
        let witness = WitnessExporter::new(4).export(&block(vec![exit_nft(1), exit_nft(2)]))?;

        assert_eq!(witness.transactions().len(), 4);
        assert_eq!(witness.num_transactions(), 2);
        assert_eq!(witness.transactions()[0].tx_type(), TxType::FullExitNft);
        assert_eq!(witness.transactions()[2], TxWitness::empty());
        assert_eq!(witness.pending_operations_count(), 2);

        let header_width = 2 + 2 + 3 * 4 + 2;
        assert_eq!(witness.to_elements().len(), header_width + 4 * TxWitness::WIDTH);
        assert!(witness.to_elements()[header_width + 2 * TxWitness::WIDTH..]
            .iter()
            .all(|element| *element == ZERO));
        Ok(())
    }

    #[test]
    fn export_is_deterministic() -> anyhow::Result<()> {
        let exporter = WitnessExporter::new(3);
        let first = exporter.export(&block(vec![exit_nft(1)]))?;
        let second = exporter.export(&block(vec![exit_nft(1)]))?;
        let other = exporter.export(&block(vec![exit_nft(2)]))?;

        assert_eq!(first.to_bytes(), second.to_bytes());
        assert_ne!(first.to_bytes(), other.to_bytes());
        Ok(())
    }

    #[test]
    fn blocks_over_capacity_are_rejected() {
        let block = block(vec![exit_nft(1), exit_nft(2)]);

        assert_matches!(
            WitnessExporter::new(1).export(&block),
            Err(WitnessError::TooManyTransactions { count: 2, capacity: 1, .. })
        );
    }
}

use std::collections::BTreeMap;

use rollup_objects::{
    account::{AccountIndex, AccountState, LiquidityPool, NftIndex, NftInfo, PairIndex},
    block::{Block, BlockHeight, BlockStatus},
    utils::serde::{Deserializable, Serializable},
};
use rollup_tx::DirtyState;

use crate::StoreError;

// STORE TRAITS
// ================================================================================================

/// Persistent storage of account, pool and NFT state.
pub trait AccountStore {
    /// Returns the stored state of the account with the given index, if any.
    ///
    /// # Errors
    /// Returns an error if the store encountered an internal error.
    fn load_account(&self, account_index: AccountIndex)
    -> Result<Option<AccountState>, StoreError>;

    /// Returns all stored accounts, pools and NFTs, from which a registry can be rebuilt.
    ///
    /// # Errors
    /// Returns an error if the store encountered an internal error.
    fn load_state(&self) -> Result<DirtyState, StoreError>;

    /// Inserts or replaces every entity in `state` in a single batch. Empty NFTs are removed.
    ///
    /// # Errors
    /// Returns an error if the store encountered an internal error, in which case nothing is
    /// written.
    fn upsert_state(&mut self, state: &DirtyState) -> Result<(), StoreError>;
}

/// Append-only persistent storage of blocks, keyed by height.
pub trait BlockStore {
    /// Returns the block with the greatest height, if any block has been stored.
    ///
    /// # Errors
    /// Returns an error if the store encountered an internal error.
    fn latest_block(&self) -> Result<Option<Block>, StoreError>;

    /// Returns the block at the given height, if it has been stored.
    ///
    /// # Errors
    /// Returns an error if the store encountered an internal error.
    fn load_block(&self, height: BlockHeight) -> Result<Option<Block>, StoreError>;

    /// Appends a block. Its height must directly follow the height of the latest stored block.
    ///
    /// # Errors
    /// Returns an error if the block does not directly follow the latest block, or if the store
    /// encountered an internal error.
    fn append_block(&mut self, block: &Block) -> Result<(), StoreError>;

    /// Records the lifecycle status of a stored block.
    ///
    /// # Errors
    /// Returns an error if the block has not been stored, or if the store encountered an internal
    /// error.
    fn update_status(&mut self, height: BlockHeight, status: BlockStatus)
    -> Result<(), StoreError>;
}

// MEMORY STORE
// ================================================================================================

/// An in-memory implementation of [`AccountStore`] and [`BlockStore`].
///
/// Blocks are kept in serialized form together with their latest status.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    accounts: BTreeMap<AccountIndex, AccountState>,
    pools: BTreeMap<PairIndex, LiquidityPool>,
    nfts: BTreeMap<NftIndex, NftInfo>,
    blocks: BTreeMap<BlockHeight, (Vec<u8>, BlockStatus)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    fn decode(
        height: BlockHeight,
        (bytes, status): &(Vec<u8>, BlockStatus),
    ) -> Result<Block, StoreError> {
        let block = Block::read_from_bytes(bytes)
            .map_err(|error| StoreError::CorruptBlock { height, error })?;
        Ok(block.with_status(*status))
    }
}

impl AccountStore for MemoryStore {
    fn load_account(
        &self,
        account_index: AccountIndex,
    ) -> Result<Option<AccountState>, StoreError> {
        Ok(self.accounts.get(&account_index).cloned())
    }

    fn load_state(&self) -> Result<DirtyState, StoreError> {
        Ok(DirtyState {
            accounts: self.accounts.values().cloned().collect(),
            pools: self.pools.values().cloned().collect(),
            nfts: self.nfts.values().cloned().collect(),
        })
    }

    fn upsert_state(&mut self, state: &DirtyState) -> Result<(), StoreError> {
        for account in &state.accounts {
            self.accounts.insert(account.account_index(), account.clone());
        }
        for pool in &state.pools {
            self.pools.insert(pool.pair_index, pool.clone());
        }
        for nft in &state.nfts {
            if nft.is_empty() {
                self.nfts.remove(&nft.nft_index);
            } else {
                self.nfts.insert(nft.nft_index, nft.clone());
            }
        }
        Ok(())
    }
}

impl BlockStore for MemoryStore {
    fn latest_block(&self) -> Result<Option<Block>, StoreError> {
        self.blocks
            .last_key_value()
            .map(|(height, stored)| Self::decode(*height, stored))
            .transpose()
    }

    fn load_block(&self, height: BlockHeight) -> Result<Option<Block>, StoreError> {
        self.blocks.get(&height).map(|stored| Self::decode(height, stored)).transpose()
    }

    fn append_block(&mut self, block: &Block) -> Result<(), StoreError> {
        let expected = match self.blocks.last_key_value() {
            Some((height, _)) => height.child(),
            None => block.height(),
        };
        if block.height() != expected {
            return Err(StoreError::NonSequentialBlock { expected, actual: block.height() });
        }
        self.blocks.insert(block.height(), (block.to_bytes(), block.status()));
        Ok(())
    }

    fn update_status(
        &mut self,
        height: BlockHeight,
        status: BlockStatus,
    ) -> Result<(), StoreError> {
        let (_, stored_status) =
            self.blocks.get_mut(&height).ok_or(StoreError::UnknownBlock(height))?;
        *stored_status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rollup_objects::{Digest, account::AssetId};

    use super::*;

    #[test]
    fn blocks_are_appended_in_height_order() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.append_block(&Block::genesis())?;

        let block = |height| {
            Block::new(BlockHeight::new(height), Digest::default(), Digest::default(), vec![], 0)
        };
        let skipped = block(2);
        assert_matches!(
            store.append_block(&skipped),
            Err(StoreError::NonSequentialBlock { expected, .. }) if expected == BlockHeight::new(1)
        );

        let next = block(1);
        store.append_block(&next)?;
        store.update_status(next.height(), BlockStatus::Committed)?;

        let latest = store.latest_block()?.expect("a block was stored");
        assert_eq!(latest.height(), BlockHeight::new(1));
        assert_eq!(latest.status(), BlockStatus::Committed);
        assert_matches!(
            store.update_status(BlockHeight::new(5), BlockStatus::Committed),
            Err(StoreError::UnknownBlock(_))
        );
        Ok(())
    }

    #[test]
    fn empty_nfts_are_removed() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        let nft_index = NftIndex::new_unchecked(4);
        let nft = NftInfo {
            nft_index,
            creator_account_index: AccountIndex::new(0),
            owner_account_index: Some(AccountIndex::new(0)),
            content_hash: Digest::default(),
            collection_id: 0,
            creator_treasury_rate: 0,
        };
        let pool = LiquidityPool::new(PairIndex::new(0), AssetId::new(0), AssetId::new(1), 30);

        let state = DirtyState { pools: vec![pool], nfts: vec![nft], ..Default::default() };
        store.upsert_state(&state)?;
        assert_eq!(store.load_state()?.nfts.len(), 1);

        let empty = DirtyState { nfts: vec![NftInfo::empty(nft_index)], ..Default::default() };
        store.upsert_state(&empty)?;
        let state = store.load_state()?;
        assert!(state.nfts.is_empty());
        assert_eq!(state.pools.len(), 1);
        Ok(())
    }
}

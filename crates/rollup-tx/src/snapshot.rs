use alloc::collections::BTreeMap;

use rollup_objects::account::{
    AccountAsset, AccountIndex, AccountState, AssetId, LiquidityPool, NftIndex, NftInfo, PairIndex,
};

use crate::VerifierError;

// STATE SNAPSHOT
// ================================================================================================

/// A read-only copy of the state a transaction can touch.
///
/// Verification only ever reads from a snapshot, so any number of transactions can be verified
/// concurrently against snapshots taken from the same registry state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    accounts: BTreeMap<AccountIndex, AccountState>,
    pools: BTreeMap<PairIndex, LiquidityPool>,
    nfts: BTreeMap<NftIndex, NftInfo>,
    next_account_index: AccountIndex,
}

impl StateSnapshot {
    /// Returns an empty snapshot in which the next account to be registered gets
    /// `next_account_index`.
    pub fn new(next_account_index: AccountIndex) -> Self {
        Self { next_account_index, ..Default::default() }
    }

    pub fn with_account(mut self, account: AccountState) -> Self {
        self.insert_account(account);
        self
    }

    pub fn with_pool(mut self, pool: LiquidityPool) -> Self {
        self.insert_pool(pool);
        self
    }

    pub fn with_nft(mut self, nft: NftInfo) -> Self {
        self.insert_nft(nft);
        self
    }

    pub fn insert_account(&mut self, account: AccountState) {
        self.accounts.insert(account.account_index(), account);
    }

    pub fn insert_pool(&mut self, pool: LiquidityPool) {
        self.pools.insert(pool.pair_index, pool);
    }

    pub fn insert_nft(&mut self, nft: NftInfo) {
        self.nfts.insert(nft.nft_index, nft);
    }

    // ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn next_account_index(&self) -> AccountIndex {
        self.next_account_index
    }

    pub fn contains_account(&self, account_index: AccountIndex) -> bool {
        self.accounts.contains_key(&account_index)
    }

    /// Returns the account with the given index.
    ///
    /// # Errors
    /// Returns [`VerifierError::MissingAccount`] if the account is not part of the snapshot.
    pub fn account(&self, account_index: AccountIndex) -> Result<&AccountState, VerifierError> {
        self.accounts
            .get(&account_index)
            .ok_or(VerifierError::MissingAccount(account_index))
    }

    /// Returns an existing asset slot of an account.
    ///
    /// # Errors
    /// Returns an error if the account is missing, or if it has no entry for the asset.
    pub fn asset(
        &self,
        account_index: AccountIndex,
        asset_id: AssetId,
    ) -> Result<&AccountAsset, VerifierError> {
        self.account(account_index)?
            .asset(asset_id)
            .ok_or(VerifierError::MissingAsset { account_index, asset_id })
    }

    /// Returns the asset slot of an account, materializing an empty slot if the account never
    /// touched the asset.
    ///
    /// # Errors
    /// Returns an error if the account is missing.
    pub fn asset_or_default(
        &self,
        account_index: AccountIndex,
        asset_id: AssetId,
    ) -> Result<AccountAsset, VerifierError> {
        Ok(self.account(account_index)?.asset(asset_id).cloned().unwrap_or_default())
    }

    /// Returns the liquidity pool with the given index.
    ///
    /// # Errors
    /// Returns [`VerifierError::MissingPool`] if the pool is not part of the snapshot.
    pub fn pool(&self, pair_index: PairIndex) -> Result<&LiquidityPool, VerifierError> {
        self.pools.get(&pair_index).ok_or(VerifierError::MissingPool(pair_index))
    }

    pub fn contains_pool(&self, pair_index: PairIndex) -> bool {
        self.pools.contains_key(&pair_index)
    }

    /// Returns the NFT slot with the given index. Slots unknown to the snapshot are empty.
    pub fn nft(&self, nft_index: NftIndex) -> NftInfo {
        self.nfts.get(&nft_index).cloned().unwrap_or_else(|| NftInfo::empty(nft_index))
    }

    /// Returns the NFT with the given index if it is currently minted.
    ///
    /// # Errors
    /// Returns [`VerifierError::MissingNft`] if the slot is empty.
    pub fn existing_nft(&self, nft_index: NftIndex) -> Result<NftInfo, VerifierError> {
        let nft = self.nft(nft_index);
        if nft.is_empty() {
            return Err(VerifierError::MissingNft(nft_index));
        }
        Ok(nft)
    }
}

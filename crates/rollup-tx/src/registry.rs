use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};

use miden_crypto::merkle::Smt;
use rollup_objects::{
    BigUint, Digest, EMPTY_WORD, Felt, Word, ZERO,
    account::{
        AccountIndex, AccountState, LiquidityPool, NftIndex, NftInfo, PairIndex, validate_amount,
    },
    block::compute_state_root,
    transaction::{
        BalanceDelta, CreatedEntity, DetailKey, ExecutedTransaction, NonceTransition, StateKey,
        StateTransition, StateValue, TransactionInfo, TxDetail, VerifiedTransaction,
    },
};
use tracing::debug;

use crate::{BalanceError, ROLLUP_TX, RegistryError, StateSnapshot, accumulator::apply_signed};

// DIRTY STATE
// ================================================================================================

/// State changed since the registry was last flushed to persistent storage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirtyState {
    pub accounts: Vec<AccountState>,
    pub pools: Vec<LiquidityPool>,
    pub nfts: Vec<NftInfo>,
}

impl DirtyState {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.pools.is_empty() && self.nfts.is_empty()
    }
}

// ACCOUNT STATE REGISTRY
// ================================================================================================

/// The authoritative state of all accounts, liquidity pools and NFTs.
///
/// The registry is the only owner of mutable state. Transactions are verified against snapshots
/// taken from it and applied one at a time, in order, through [`Self::apply_transaction`].
///
/// Accounts, pools and NFTs are each committed to by a sparse Merkle tree keyed by their index.
/// The value of a leaf is the commitment to the entity, or [`EMPTY_WORD`] for an empty NFT slot.
#[derive(Debug, Clone)]
pub struct AccountStateRegistry {
    accounts: BTreeMap<AccountIndex, AccountState>,
    pools: BTreeMap<PairIndex, LiquidityPool>,
    nfts: BTreeMap<NftIndex, NftInfo>,
    account_tree: Smt,
    pool_tree: Smt,
    nft_tree: Smt,
    next_account_index: AccountIndex,
    dirty_accounts: BTreeSet<AccountIndex>,
    dirty_pools: BTreeSet<PairIndex>,
    dirty_nfts: BTreeSet<NftIndex>,
}

/// Changes of a single transaction which have been validated but not yet committed.
#[derive(Default)]
struct StagedState {
    accounts: BTreeMap<AccountIndex, AccountState>,
    pools: BTreeMap<PairIndex, LiquidityPool>,
    nfts: BTreeMap<NftIndex, NftInfo>,
    transitions: Vec<StateTransition>,
}

impl Default for AccountStateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStateRegistry {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Returns an empty registry whose state root is
    /// [`empty_state_root`](rollup_objects::block::empty_state_root).
    pub fn new() -> Self {
        Self {
            accounts: BTreeMap::new(),
            pools: BTreeMap::new(),
            nfts: BTreeMap::new(),
            account_tree: Smt::new(),
            pool_tree: Smt::new(),
            nft_tree: Smt::new(),
            next_account_index: AccountIndex::new(0),
            dirty_accounts: BTreeSet::new(),
            dirty_pools: BTreeSet::new(),
            dirty_nfts: BTreeSet::new(),
        }
    }

    /// Returns a registry loaded with previously persisted state. Nothing is marked as dirty.
    pub fn from_state(
        accounts: impl IntoIterator<Item = AccountState>,
        pools: impl IntoIterator<Item = LiquidityPool>,
        nfts: impl IntoIterator<Item = NftInfo>,
    ) -> Self {
        let mut registry = Self::new();
        for account in accounts {
            registry.store_account(account);
        }
        for pool in pools {
            registry.store_pool(pool);
        }
        for nft in nfts {
            registry.store_nft(nft);
        }
        registry.take_dirty_state();
        registry
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn get_account(&self, account_index: AccountIndex) -> Option<&AccountState> {
        self.accounts.get(&account_index)
    }

    pub fn pool(&self, pair_index: PairIndex) -> Option<&LiquidityPool> {
        self.pools.get(&pair_index)
    }

    /// Returns the NFT slot with the given index. Slots which were never minted are empty.
    pub fn nft(&self, nft_index: NftIndex) -> NftInfo {
        self.nfts.get(&nft_index).cloned().unwrap_or_else(|| NftInfo::empty(nft_index))
    }

    /// Returns the index the next registered account must have.
    pub fn next_account_index(&self) -> AccountIndex {
        self.next_account_index
    }

    pub fn num_accounts(&self) -> usize {
        self.accounts.len()
    }

    pub fn account_root(&self) -> Digest {
        self.account_tree.root()
    }

    pub fn pool_root(&self) -> Digest {
        self.pool_tree.root()
    }

    pub fn nft_root(&self) -> Digest {
        self.nft_tree.root()
    }

    /// Returns the root committing to the entire state.
    pub fn state_root(&self) -> Digest {
        compute_state_root(self.account_root(), self.pool_root(), self.nft_root())
    }

    /// Returns a snapshot of the state the provided transaction can touch.
    ///
    /// For every NFT in the footprint of the transaction the snapshot also contains the NFT's
    /// creator, which receives royalties when the token is sold.
    pub fn snapshot_for(&self, tx: &TransactionInfo) -> StateSnapshot {
        let footprint = tx.footprint();
        let mut snapshot = StateSnapshot::new(self.next_account_index);
        for key in footprint.reads.iter().chain(footprint.credits.iter()) {
            match key {
                StateKey::Account(account_index) => {
                    if let Some(account) = self.accounts.get(account_index) {
                        snapshot.insert_account(account.clone());
                    }
                },
                StateKey::Pool(pair_index) => {
                    if let Some(pool) = self.pools.get(pair_index) {
                        snapshot.insert_pool(pool.clone());
                    }
                },
                StateKey::Nft(nft_index) => {
                    if let Some(nft) = self.nfts.get(nft_index) {
                        if let Some(creator) = self.accounts.get(&nft.creator_account_index) {
                            snapshot.insert_account(creator.clone());
                        }
                        snapshot.insert_nft(nft.clone());
                    }
                },
            }
        }
        snapshot
    }

    // STATE MUTATORS
    // --------------------------------------------------------------------------------------------

    /// Applies the ordered detail records of one transaction.
    ///
    /// Either every record is applied or, if any of them fails, none is.
    ///
    /// # Errors
    /// Returns an error if:
    /// - a record refers to an account or pool which does not exist.
    /// - a balance, pool share or pool reserve would become negative.
    /// - a resulting amount would not fit into a state amount.
    pub fn apply_deltas(&mut self, details: &[TxDetail]) -> Result<(), BalanceError> {
        let mut staged = StagedState::default();
        self.stage_details(&mut staged, details)?;
        self.commit(staged);
        Ok(())
    }

    /// Applies a verified transaction and returns it together with the state it touched.
    ///
    /// The transaction's nonce expectation is re-checked against the current state, since other
    /// transactions may have been applied after this one was verified.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the originating account does not exist or its nonce no longer matches.
    /// - a created account does not take the next account index, or a created pool exists.
    /// - applying the transaction's details fails. See [`Self::apply_deltas`].
    pub fn apply_transaction(
        &mut self,
        verified: &VerifiedTransaction,
    ) -> Result<ExecutedTransaction, RegistryError> {
        let mut staged = StagedState::default();

        if let Some((account_index, expected)) = verified.expected_nonce() {
            let account = self
                .accounts
                .get(&account_index)
                .ok_or(RegistryError::UnknownAccount(account_index))?;
            if account.nonce() != expected {
                return Err(RegistryError::StaleNonce {
                    account_index,
                    expected,
                    actual: account.nonce(),
                });
            }
        }

        match verified.created() {
            Some(CreatedEntity::Account(account)) => {
                let account_index = account.account_index();
                if self.accounts.contains_key(&account_index) {
                    return Err(RegistryError::AccountAlreadyExists(account_index));
                }
                if account_index != self.next_account_index {
                    return Err(RegistryError::NonSequentialAccountIndex {
                        expected: self.next_account_index,
                        actual: account_index,
                    });
                }
                staged.accounts.insert(account_index, account.clone());
            },
            Some(CreatedEntity::Pool(pool)) => {
                if self.pools.contains_key(&pool.pair_index) {
                    return Err(RegistryError::PoolAlreadyExists(pool.pair_index));
                }
                staged.pools.insert(pool.pair_index, pool.clone());
            },
            None => (),
        }

        self.stage_details(&mut staged, verified.details())?;

        let mut nonce_transition = None;
        if let Some((account_index, expected)) = verified.expected_nonce() {
            let account = self.staged_account(&mut staged, account_index)?;
            account.set_nonce(expected + 1);
            nonce_transition = Some(NonceTransition {
                account_index,
                before: expected,
                after: expected + 1,
            });
        }
        if let Some((account_index, collection_nonce)) = verified.collection_nonce() {
            self.staged_account(&mut staged, account_index)?
                .set_collection_nonce(collection_nonce);
        }

        let transitions = core::mem::take(&mut staged.transitions);
        self.commit(staged);

        debug!(
            target: ROLLUP_TX,
            tx_id = %verified.id(),
            tx_type = %verified.tx().tx_type(),
            details = verified.details().len(),
            "Applied transaction"
        );

        Ok(ExecutedTransaction::new(verified.clone(), transitions, nonce_transition))
    }

    /// Returns the state changed since the last call and clears the dirty markers.
    pub fn take_dirty_state(&mut self) -> DirtyState {
        let accounts = core::mem::take(&mut self.dirty_accounts)
            .into_iter()
            .filter_map(|index| self.accounts.get(&index).cloned())
            .collect();
        let pools = core::mem::take(&mut self.dirty_pools)
            .into_iter()
            .filter_map(|index| self.pools.get(&index).cloned())
            .collect();
        let nfts = core::mem::take(&mut self.dirty_nfts)
            .into_iter()
            .map(|index| self.nft(index))
            .collect();
        DirtyState { accounts, pools, nfts }
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    /// Applies `details` on top of `staged`, recording the state transition of every record.
    fn stage_details(
        &self,
        staged: &mut StagedState,
        details: &[TxDetail],
    ) -> Result<(), BalanceError> {
        for detail in details {
            let key = detail.key();
            let (pre, post) = match &detail.delta {
                BalanceDelta::Asset { account_index, asset_id, balance, offer_bitmap } => {
                    let account = self.staged_account(staged, *account_index)?;
                    let mut asset = account.asset(*asset_id).cloned().unwrap_or_default();
                    let pre = StateValue::Asset(asset.clone());

                    asset.balance = apply_signed(&asset.balance, balance).map_err(|_| {
                        BalanceError::NegativeBalance {
                            account_index: *account_index,
                            asset_id: *asset_id,
                        }
                    })?;
                    check_range(&asset.balance, key)?;
                    if let Some(bitmap) = offer_bitmap {
                        asset.offer_bitmap |= bitmap;
                        check_range(&asset.offer_bitmap, key)?;
                    }

                    account.set_asset(*asset_id, asset.clone());
                    (pre, StateValue::Asset(asset))
                },
                BalanceDelta::LpShare { account_index, pair_index, lp_amount } => {
                    let account = self.staged_account(staged, *account_index)?;
                    let asset_id = pair_index.lp_asset_id();
                    let mut asset = account.asset(asset_id).cloned().unwrap_or_default();
                    let pre = StateValue::LpShare(asset.lp_amount.clone());

                    asset.lp_amount = apply_signed(&asset.lp_amount, lp_amount).map_err(|_| {
                        BalanceError::NegativeLpAmount {
                            account_index: *account_index,
                            pair_index: *pair_index,
                        }
                    })?;
                    check_range(&asset.lp_amount, key)?;

                    let post = StateValue::LpShare(asset.lp_amount.clone());
                    account.set_asset(asset_id, asset);
                    (pre, post)
                },
                BalanceDelta::Pool { pair_index, asset_a, asset_b, lp_amount } => {
                    let pool = self.staged_pool(staged, *pair_index)?;
                    let pre = StateValue::Pool(pool.clone());
                    let negative = |_| BalanceError::NegativeReserve(*pair_index);

                    pool.asset_a = apply_signed(&pool.asset_a, asset_a).map_err(negative)?;
                    pool.asset_b = apply_signed(&pool.asset_b, asset_b).map_err(negative)?;
                    pool.lp_amount = apply_signed(&pool.lp_amount, lp_amount).map_err(negative)?;
                    check_range(&pool.asset_a, key)?;
                    check_range(&pool.asset_b, key)?;
                    check_range(&pool.lp_amount, key)?;

                    (pre, StateValue::Pool(pool.clone()))
                },
                BalanceDelta::Nft { nft_index, new_state } => {
                    let pre = staged
                        .nfts
                        .get(nft_index)
                        .cloned()
                        .unwrap_or_else(|| self.nft(*nft_index));
                    staged.nfts.insert(*nft_index, new_state.clone());
                    (StateValue::Nft(pre), StateValue::Nft(new_state.clone()))
                },
            };
            staged.transitions.push(StateTransition { key, pre, post });
        }
        Ok(())
    }

    /// Returns the staged copy of an account, copying it from the registry on first access.
    fn staged_account<'a>(
        &self,
        staged: &'a mut StagedState,
        account_index: AccountIndex,
    ) -> Result<&'a mut AccountState, BalanceError> {
        if !staged.accounts.contains_key(&account_index) {
            let account = self
                .accounts
                .get(&account_index)
                .ok_or(BalanceError::UnknownAccount(account_index))?;
            staged.accounts.insert(account_index, account.clone());
        }
        staged
            .accounts
            .get_mut(&account_index)
            .ok_or(BalanceError::UnknownAccount(account_index))
    }

    /// Returns the staged copy of a pool, copying it from the registry on first access.
    fn staged_pool<'a>(
        &self,
        staged: &'a mut StagedState,
        pair_index: PairIndex,
    ) -> Result<&'a mut LiquidityPool, BalanceError> {
        if !staged.pools.contains_key(&pair_index) {
            let pool = self.pools.get(&pair_index).ok_or(BalanceError::UnknownPool(pair_index))?;
            staged.pools.insert(pair_index, pool.clone());
        }
        staged.pools.get_mut(&pair_index).ok_or(BalanceError::UnknownPool(pair_index))
    }

    fn commit(&mut self, staged: StagedState) {
        for account in staged.accounts.into_values() {
            self.store_account(account);
        }
        for pool in staged.pools.into_values() {
            self.store_pool(pool);
        }
        for nft in staged.nfts.into_values() {
            self.store_nft(nft);
        }
    }

    fn store_account(&mut self, account: AccountState) {
        let account_index = account.account_index();
        self.account_tree
            .insert(smt_key(account_index.as_u32() as u64), Word::from(account.commitment()));
        if account_index >= self.next_account_index {
            self.next_account_index = AccountIndex::new(account_index.as_u32() + 1);
        }
        self.dirty_accounts.insert(account_index);
        self.accounts.insert(account_index, account);
    }

    fn store_pool(&mut self, pool: LiquidityPool) {
        let pair_index = pool.pair_index;
        self.pool_tree
            .insert(smt_key(pair_index.as_u16() as u64), Word::from(pool.commitment()));
        self.dirty_pools.insert(pair_index);
        self.pools.insert(pair_index, pool);
    }

    fn store_nft(&mut self, nft: NftInfo) {
        let nft_index = nft.nft_index;
        let value = nft.commitment().map(Word::from).unwrap_or(EMPTY_WORD);
        self.nft_tree.insert(smt_key(nft_index.as_u64()), value);
        self.dirty_nfts.insert(nft_index);
        if nft.is_empty() {
            self.nfts.remove(&nft_index);
        } else {
            self.nfts.insert(nft_index, nft);
        }
    }
}

/// Returns the tree key of an entity index. The index goes into the most significant element,
/// which determines the leaf of the key.
fn smt_key(index: u64) -> Digest {
    Digest::from([ZERO, ZERO, ZERO, Felt::new(index)])
}

fn check_range(amount: &BigUint, key: DetailKey) -> Result<(), BalanceError> {
    validate_amount(amount).map_err(|_| BalanceError::AmountOverflow(key))
}

use alloc::vec::Vec;

use rollup_objects::{
    account::{AccountState, LiquidityPool, NftInfo, account_name_hash},
    transaction::{
        CreatePairTx, CreatedEntity, DepositNftTx, DepositTx, FullExitNftTx, FullExitTx,
        PubdataBuilder, RegisterTx, TransactionInfo, VerifiedTransaction,
    },
};

use super::{
    TransactionVerifier, check_amount, check_name_hash, check_nft_index, check_rate, credit, debit,
    finalize,
};
use crate::{DeltaAccumulator, SignatureScheme, StateSnapshot, VerifierError};

// PRIORITY OPERATIONS
// ================================================================================================

impl<S: SignatureScheme> TransactionVerifier<S> {
    /// Registers a new account at the next free account index.
    pub(super) fn verify_register(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        register: &RegisterTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        if snapshot.contains_account(register.account_index) {
            return Err(VerifierError::AccountAlreadyExists(register.account_index));
        }
        if register.account_index != snapshot.next_account_index() {
            return Err(VerifierError::InvalidPayload("account index is not the next free index"));
        }
        let account = AccountState::new(
            register.account_index,
            register.account_name.clone(),
            register.public_key,
        )
        .map_err(VerifierError::InvalidAccountName)?;

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(register.account_index)
            .digest(account_name_hash(&register.account_name))
            .digest(register.public_key)
            .build();

        Ok(VerifiedTransaction::new(tx.clone(), Vec::new(), pubdata)
            .with_created(CreatedEntity::Account(account)))
    }

    /// Creates an empty liquidity pool for a pair of distinct assets.
    pub(super) fn verify_create_pair(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        create_pair: &CreatePairTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        if snapshot.contains_pool(create_pair.pair_index) {
            return Err(VerifierError::PoolAlreadyExists(create_pair.pair_index));
        }
        if create_pair.asset_a_id == create_pair.asset_b_id {
            return Err(VerifierError::InvalidPayload("pool assets must be distinct"));
        }
        check_rate(create_pair.fee_rate)?;

        let pool = LiquidityPool::new(
            create_pair.pair_index,
            create_pair.asset_a_id,
            create_pair.asset_b_id,
            create_pair.fee_rate,
        );
        let pubdata = PubdataBuilder::new(tx.tx_type())
            .pair_index(create_pair.pair_index)
            .asset_id(create_pair.asset_a_id)
            .asset_id(create_pair.asset_b_id)
            .rate(create_pair.fee_rate)
            .build();

        Ok(VerifiedTransaction::new(tx.clone(), Vec::new(), pubdata)
            .with_created(CreatedEntity::Pool(pool)))
    }

    pub(super) fn verify_deposit(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        deposit: &DepositTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let account = snapshot.account(deposit.account_index)?;
        check_name_hash(account, deposit.account_name_hash)?;
        check_amount(&deposit.amount)?;

        let mut accumulator = DeltaAccumulator::new();
        accumulator.add(deposit.account_index, deposit.asset_id, credit(&deposit.amount));

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(deposit.account_index)
            .digest(deposit.account_name_hash)
            .asset_id(deposit.asset_id)
            .amount(&deposit.amount)
            .build();

        finalize(snapshot, tx, accumulator, pubdata)
    }

    pub(super) fn verify_deposit_nft(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        deposit: &DepositNftTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let account = snapshot.account(deposit.account_index)?;
        check_name_hash(account, deposit.account_name_hash)?;
        check_nft_index(deposit.nft_index)?;
        if !snapshot.nft(deposit.nft_index).is_empty() {
            return Err(VerifierError::NftAlreadyExists(deposit.nft_index));
        }
        check_rate(deposit.creator_treasury_rate)?;

        let mut accumulator = DeltaAccumulator::new();
        accumulator.set_nft(
            deposit.nft_index,
            NftInfo {
                nft_index: deposit.nft_index,
                creator_account_index: deposit.creator_account_index,
                owner_account_index: Some(deposit.account_index),
                content_hash: deposit.content_hash,
                collection_id: deposit.collection_id,
                creator_treasury_rate: deposit.creator_treasury_rate,
            },
        );

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(deposit.account_index)
            .digest(deposit.account_name_hash)
            .nft_index(deposit.nft_index)
            .account_index(deposit.creator_account_index)
            .rate(deposit.creator_treasury_rate)
            .collection_id(deposit.collection_id)
            .digest(deposit.content_hash)
            .build();

        finalize(snapshot, tx, accumulator, pubdata)
    }

    /// Withdraws the entire balance of an asset to the base chain.
    ///
    /// A full exit cannot be rejected by the rollup once requested on the base chain. If the name
    /// hash does not match the account, the exit is processed for an amount of zero.
    pub(super) fn verify_full_exit(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        exit: &FullExitTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let account = snapshot.account(exit.account_index)?;
        let amount = if account.account_name_hash() == exit.account_name_hash {
            account.asset(exit.asset_id).map(|asset| asset.balance.clone()).unwrap_or_default()
        } else {
            Default::default()
        };

        let mut accumulator = DeltaAccumulator::new();
        accumulator.add(exit.account_index, exit.asset_id, debit(&amount));

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(exit.account_index)
            .digest(exit.account_name_hash)
            .asset_id(exit.asset_id)
            .amount(&amount)
            .build();

        finalize(snapshot, tx, accumulator, pubdata)
    }

    /// Withdraws an NFT to the base chain.
    ///
    /// If the token is not owned by the account, or the name hash does not match, the exit is a
    /// no-op which leaves the token untouched.
    pub(super) fn verify_full_exit_nft(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        exit: &FullExitNftTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let account = snapshot.account(exit.account_index)?;
        let nft = snapshot.nft(exit.nft_index);
        let succeeds = account.account_name_hash() == exit.account_name_hash
            && nft.is_owned_by(exit.account_index);

        let (exited, remaining) = if succeeds {
            (nft, NftInfo::empty(exit.nft_index))
        } else {
            (NftInfo::empty(exit.nft_index), nft)
        };

        let mut accumulator = DeltaAccumulator::new();
        accumulator.set_nft(exit.nft_index, remaining);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(exit.account_index)
            .digest(exit.account_name_hash)
            .nft_index(exit.nft_index)
            .account_index(exited.creator_account_index)
            .rate(exited.creator_treasury_rate)
            .collection_id(exited.collection_id)
            .digest(exited.content_hash)
            .build();

        finalize(snapshot, tx, accumulator, pubdata)
    }
}

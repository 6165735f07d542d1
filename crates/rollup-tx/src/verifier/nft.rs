use rollup_objects::{
    account::NftInfo,
    transaction::{
        CreateCollectionTx, MintNftTx, PubdataBuilder, TransactionInfo, TransferNftTx,
        VerifiedTransaction, WithdrawNftTx,
    },
};

use super::{
    TransactionVerifier, charge_gas, check_name_hash, check_nft_index, check_rate, credit_gas,
    finalize, gas_pubdata,
};
use crate::{DeltaAccumulator, SignatureScheme, StateSnapshot, VerifierError};

// NFT OPERATIONS
// ================================================================================================

impl<S: SignatureScheme> TransactionVerifier<S> {
    /// Creates the next NFT collection of an account.
    pub(super) fn verify_create_collection(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        create: &CreateCollectionTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let account = snapshot.account(create.account_index)?;
        if create.collection_id as u64 != account.collection_nonce() {
            return Err(VerifierError::InvalidPayload("collection id is not the next collection"));
        }
        self.authenticate(snapshot, tx, create.account_index, &create.gas, create.nonce)?;

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, create.account_index, &create.gas);
        credit_gas(&mut accumulator, &create.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(create.account_index)
            .collection_id(create.collection_id);
        let pubdata = gas_pubdata(pubdata, &create.gas).build();

        Ok(finalize(snapshot, tx, accumulator, pubdata)?
            .with_collection_nonce(create.account_index, account.collection_nonce() + 1))
    }

    /// Mints a new NFT of one of the creator's collections to a recipient.
    pub(super) fn verify_mint_nft(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        mint: &MintNftTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let creator = snapshot.account(mint.account_index)?;
        let recipient = snapshot.account(mint.to_account_index)?;
        check_name_hash(recipient, mint.to_account_name_hash)?;
        check_nft_index(mint.nft_index)?;
        if !snapshot.nft(mint.nft_index).is_empty() {
            return Err(VerifierError::NftAlreadyExists(mint.nft_index));
        }
        if mint.collection_id as u64 >= creator.collection_nonce() {
            return Err(VerifierError::InvalidPayload("collection does not exist"));
        }
        check_rate(mint.creator_treasury_rate)?;
        self.authenticate(snapshot, tx, mint.account_index, &mint.gas, mint.nonce)?;

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, mint.account_index, &mint.gas);
        accumulator.set_nft(
            mint.nft_index,
            NftInfo {
                nft_index: mint.nft_index,
                creator_account_index: mint.account_index,
                owner_account_index: Some(mint.to_account_index),
                content_hash: mint.content_hash,
                collection_id: mint.collection_id,
                creator_treasury_rate: mint.creator_treasury_rate,
            },
        );
        credit_gas(&mut accumulator, &mint.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(mint.account_index)
            .account_index(mint.to_account_index)
            .nft_index(mint.nft_index);
        let pubdata = gas_pubdata(pubdata, &mint.gas)
            .rate(mint.creator_treasury_rate)
            .collection_id(mint.collection_id)
            .digest(mint.content_hash)
            .build();

        finalize(snapshot, tx, accumulator, pubdata)
    }

    pub(super) fn verify_transfer_nft(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        transfer: &TransferNftTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let recipient = snapshot.account(transfer.to_account_index)?;
        check_name_hash(recipient, transfer.to_account_name_hash)?;
        let nft = snapshot.existing_nft(transfer.nft_index)?;
        if !nft.is_owned_by(transfer.account_index) {
            return Err(VerifierError::NftNotOwned {
                nft_index: transfer.nft_index,
                account_index: transfer.account_index,
            });
        }
        self.authenticate(snapshot, tx, transfer.account_index, &transfer.gas, transfer.nonce)?;

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, transfer.account_index, &transfer.gas);
        accumulator.set_nft(transfer.nft_index, nft.with_owner(transfer.to_account_index));
        credit_gas(&mut accumulator, &transfer.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(transfer.account_index)
            .account_index(transfer.to_account_index)
            .nft_index(transfer.nft_index);
        let pubdata = gas_pubdata(pubdata, &transfer.gas)
            .digest(transfer.to_account_name_hash)
            .build();

        finalize(snapshot, tx, accumulator, pubdata)
    }

    /// Moves an NFT to an address on the base chain. The slot of the token becomes empty.
    pub(super) fn verify_withdraw_nft(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        withdraw: &WithdrawNftTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let nft = snapshot.existing_nft(withdraw.nft_index)?;
        if !nft.is_owned_by(withdraw.account_index) {
            return Err(VerifierError::NftNotOwned {
                nft_index: withdraw.nft_index,
                account_index: withdraw.account_index,
            });
        }
        self.authenticate(snapshot, tx, withdraw.account_index, &withdraw.gas, withdraw.nonce)?;

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, withdraw.account_index, &withdraw.gas);
        accumulator.set_nft(withdraw.nft_index, NftInfo::empty(withdraw.nft_index));
        credit_gas(&mut accumulator, &withdraw.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(withdraw.account_index)
            .account_index(nft.creator_account_index)
            .rate(nft.creator_treasury_rate)
            .nft_index(withdraw.nft_index)
            .collection_id(nft.collection_id)
            .address(&withdraw.to_address);
        let pubdata = gas_pubdata(pubdata, &withdraw.gas).digest(nft.content_hash).build();

        finalize(snapshot, tx, accumulator, pubdata)
    }
}

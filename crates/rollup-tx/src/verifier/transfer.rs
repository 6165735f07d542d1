use rollup_objects::transaction::{
    PubdataBuilder, TransactionInfo, TransferTx, VerifiedTransaction, WithdrawTx,
};

use super::{
    TransactionVerifier, charge_gas, check_amount, check_name_hash, credit, credit_gas, debit,
    finalize, gas_pubdata,
};
use crate::{DeltaAccumulator, SignatureScheme, StateSnapshot, VerifierError};

// TRANSFERS AND WITHDRAWALS
// ================================================================================================

impl<S: SignatureScheme> TransactionVerifier<S> {
    pub(super) fn verify_transfer(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        transfer: &TransferTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let recipient = snapshot.account(transfer.to_account_index)?;
        check_name_hash(recipient, transfer.to_account_name_hash)?;
        snapshot.asset(transfer.account_index, transfer.asset_id)?;
        check_amount(&transfer.amount)?;
        self.authenticate(snapshot, tx, transfer.account_index, &transfer.gas, transfer.nonce)?;

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, transfer.account_index, &transfer.gas);
        accumulator.add(transfer.account_index, transfer.asset_id, debit(&transfer.amount));
        accumulator.add(transfer.to_account_index, transfer.asset_id, credit(&transfer.amount));
        credit_gas(&mut accumulator, &transfer.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(transfer.account_index)
            .account_index(transfer.to_account_index)
            .asset_id(transfer.asset_id)
            .amount(&transfer.amount);
        let pubdata = gas_pubdata(pubdata, &transfer.gas)
            .digest(transfer.to_account_name_hash)
            .build();

        finalize(snapshot, tx, accumulator, pubdata)
    }

    /// Moves an amount of an asset from the rollup to an address on the base chain.
    pub(super) fn verify_withdraw(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        withdraw: &WithdrawTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        snapshot.asset(withdraw.account_index, withdraw.asset_id)?;
        check_amount(&withdraw.amount)?;
        self.authenticate(snapshot, tx, withdraw.account_index, &withdraw.gas, withdraw.nonce)?;

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, withdraw.account_index, &withdraw.gas);
        accumulator.add(withdraw.account_index, withdraw.asset_id, debit(&withdraw.amount));
        credit_gas(&mut accumulator, &withdraw.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(withdraw.account_index)
            .address(&withdraw.to_address)
            .asset_id(withdraw.asset_id)
            .amount(&withdraw.amount);
        let pubdata = gas_pubdata(pubdata, &withdraw.gas).build();

        finalize(snapshot, tx, accumulator, pubdata)
    }
}

use alloc::vec::Vec;

use num_bigint::{BigInt, BigUint};
use rollup_objects::{
    AmountError, Digest, RATE_BASE,
    account::{AccountIndex, AccountState, NftIndex, validate_amount},
    transaction::{GasFee, PubdataBuilder, TransactionInfo, VerifiedTransaction},
};
use tracing::debug;

use crate::{
    DeltaAccumulator, ROLLUP_TX, RpoFalcon512Scheme, SignatureScheme, StateSnapshot,
    VerifierError,
};

mod liquidity;
mod nft;
mod offer;
mod priority;
mod transfer;

// CONFIGURATION
// ================================================================================================

/// How the verifier treats the cancellation of an offer which is already canceled or finalized.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OfferRecancelPolicy {
    /// The cancellation is accepted; the offer bit stays set.
    #[default]
    Allow,
    /// The cancellation is rejected with [`VerifierError::OfferAlreadyFinalized`].
    Reject,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VerifierConfig {
    pub offer_recancel_policy: OfferRecancelPolicy,
}

// TRANSACTION VERIFIER
// ================================================================================================

/// Verifies transactions against state snapshots.
///
/// Verification has no side effects: on success it returns the ordered detail records the
/// transaction applies, on failure nothing is returned. Checks run in the following order and
/// stop at the first failure:
/// 1. Structural checks: every referenced account, asset, pool and NFT exists and the payload is
///    well formed.
/// 2. For signed transactions, the transaction nonce equals the nonce of the originating account.
/// 3. For signed transactions, the signature is valid for the hash of the signing fields.
/// 4. The accumulated changes keep every balance, pool share and reserve non-negative.
///
/// The detail records of a signed transaction start with the gas fee debit of the originating
/// account, followed by the effects of the operation, followed by the gas fee credit of the gas
/// account.
#[derive(Debug, Clone)]
pub struct TransactionVerifier<S = RpoFalcon512Scheme> {
    scheme: S,
    config: VerifierConfig,
}

impl Default for TransactionVerifier<RpoFalcon512Scheme> {
    fn default() -> Self {
        Self::new(RpoFalcon512Scheme, VerifierConfig::default())
    }
}

impl<S: SignatureScheme> TransactionVerifier<S> {
    pub fn new(scheme: S, config: VerifierConfig) -> Self {
        Self { scheme, config }
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verifies `tx` against `snapshot`.
    ///
    /// # Errors
    /// Returns an error if any of the checks listed in the type level documentation fails.
    pub fn verify(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let result = match tx {
            TransactionInfo::Register(inner) => self.verify_register(snapshot, tx, inner),
            TransactionInfo::CreatePair(inner) => self.verify_create_pair(snapshot, tx, inner),
            TransactionInfo::Deposit(inner) => self.verify_deposit(snapshot, tx, inner),
            TransactionInfo::DepositNft(inner) => self.verify_deposit_nft(snapshot, tx, inner),
            TransactionInfo::FullExit(inner) => self.verify_full_exit(snapshot, tx, inner),
            TransactionInfo::FullExitNft(inner) => self.verify_full_exit_nft(snapshot, tx, inner),
            TransactionInfo::Transfer(inner) => self.verify_transfer(snapshot, tx, inner),
            TransactionInfo::Withdraw(inner) => self.verify_withdraw(snapshot, tx, inner),
            TransactionInfo::Swap(inner) => self.verify_swap(snapshot, tx, inner),
            TransactionInfo::AddLiquidity(inner) => {
                self.verify_add_liquidity(snapshot, tx, inner)
            },
            TransactionInfo::RemoveLiquidity(inner) => {
                self.verify_remove_liquidity(snapshot, tx, inner)
            },
            TransactionInfo::CreateCollection(inner) => {
                self.verify_create_collection(snapshot, tx, inner)
            },
            TransactionInfo::MintNft(inner) => self.verify_mint_nft(snapshot, tx, inner),
            TransactionInfo::TransferNft(inner) => self.verify_transfer_nft(snapshot, tx, inner),
            TransactionInfo::WithdrawNft(inner) => self.verify_withdraw_nft(snapshot, tx, inner),
            TransactionInfo::CancelOffer(inner) => self.verify_cancel_offer(snapshot, tx, inner),
            TransactionInfo::AtomicMatch(inner) => self.verify_atomic_match(snapshot, tx, inner),
        };

        match &result {
            Ok(verified) => debug!(
                target: ROLLUP_TX,
                tx_id = %verified.id(),
                tx_type = %tx.tx_type(),
                details = verified.details().len(),
                "Verified transaction"
            ),
            Err(err) => debug!(
                target: ROLLUP_TX,
                tx_type = %tx.tx_type(),
                kind = ?err.kind(),
                %err,
                "Rejected transaction"
            ),
        }
        result
    }

    // SHARED CHECKS
    // --------------------------------------------------------------------------------------------

    /// Runs the checks shared by all signed transactions and returns the originating account.
    ///
    /// The gas fee checks are structural and run first, followed by the nonce check and the
    /// signature check.
    fn authenticate<'a>(
        &self,
        snapshot: &'a StateSnapshot,
        tx: &TransactionInfo,
        account_index: AccountIndex,
        gas: &GasFee,
        nonce: u64,
    ) -> Result<&'a AccountState, VerifierError> {
        let account = snapshot.account(account_index)?;
        snapshot.account(gas.gas_account_index)?;
        snapshot.asset(account_index, gas.asset_id)?;
        check_amount(&gas.amount)?;

        if account.nonce() != nonce {
            return Err(VerifierError::NonceMismatch {
                account_index,
                expected: account.nonce(),
                actual: nonce,
            });
        }

        let signature = tx.signature().unwrap_or_default();
        let message = self.scheme.hash(tx.signing_fields().as_elements());
        self.check_signature(account, signature, message)?;

        Ok(account)
    }

    fn check_signature(
        &self,
        account: &AccountState,
        signature: &[u8],
        message: Digest,
    ) -> Result<(), VerifierError> {
        if !self.scheme.verify(&account.public_key(), signature, message) {
            return Err(VerifierError::InvalidSignature(account.account_index()));
        }
        Ok(())
    }
}

// HELPERS
// ================================================================================================

/// Checks the accumulated changes and wraps them into a verified transaction.
fn finalize(
    snapshot: &StateSnapshot,
    tx: &TransactionInfo,
    accumulator: DeltaAccumulator,
    pubdata: Vec<u8>,
) -> Result<VerifiedTransaction, VerifierError> {
    accumulator.check_against(snapshot)?;
    let details = accumulator.into_details(snapshot);
    Ok(VerifiedTransaction::new(tx.clone(), details, pubdata))
}

/// Debits the gas fee from the originating account. Must be the first change of a transaction.
fn charge_gas(accumulator: &mut DeltaAccumulator, account_index: AccountIndex, gas: &GasFee) {
    accumulator.add(account_index, gas.asset_id, debit(&gas.amount));
}

/// Credits the gas fee to the gas account. Must be the last change of a transaction.
fn credit_gas(accumulator: &mut DeltaAccumulator, gas: &GasFee) {
    accumulator.add(gas.gas_account_index, gas.asset_id, credit(&gas.amount));
}

/// Appends the gas fee fields to the pubdata of a signed transaction.
fn gas_pubdata(builder: PubdataBuilder, gas: &GasFee) -> PubdataBuilder {
    builder.account_index(gas.gas_account_index).asset_id(gas.asset_id).amount(&gas.amount)
}

fn check_amount(amount: &BigUint) -> Result<(), VerifierError> {
    validate_amount(amount).map_err(VerifierError::AmountOutOfRange)
}

fn check_rate(rate: u16) -> Result<(), VerifierError> {
    if rate as u32 >= RATE_BASE {
        return Err(VerifierError::AmountOutOfRange(AmountError::RateTooLarge(rate)));
    }
    Ok(())
}

fn check_nft_index(nft_index: NftIndex) -> Result<(), VerifierError> {
    if !nft_index.is_valid() {
        return Err(VerifierError::AmountOutOfRange(AmountError::NftIndexTooLarge(
            nft_index.as_u64(),
        )));
    }
    Ok(())
}

fn check_name_hash(account: &AccountState, name_hash: Digest) -> Result<(), VerifierError> {
    if account.account_name_hash() != name_hash {
        return Err(VerifierError::AccountNameHashMismatch(account.account_index()));
    }
    Ok(())
}

fn credit(amount: &BigUint) -> BigInt {
    BigInt::from(amount.clone())
}

fn debit(amount: &BigUint) -> BigInt {
    -BigInt::from(amount.clone())
}

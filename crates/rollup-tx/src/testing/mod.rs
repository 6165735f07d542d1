use alloc::vec::Vec;

use rollup_objects::{
    Digest, ElementWriter, Felt, Hasher,
    account::{AccountAsset, AccountIndex, AccountState, AssetId},
    transaction::{Offer, TransactionInfo},
};

use crate::{SignatureScheme, TransactionVerifier, VerifierConfig};

// MOCK SIGNATURE SCHEME
// ================================================================================================

/// A signature scheme which is cheap to sign with.
///
/// The only valid signature of `message` under `public_key` is the serialized digest
/// `merge(public_key, message)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockSignatureScheme;

impl MockSignatureScheme {
    pub fn sign(public_key: Digest, message: Digest) -> Vec<u8> {
        Hasher::merge(&[public_key, message]).as_bytes().to_vec()
    }
}

impl SignatureScheme for MockSignatureScheme {
    fn verify(&self, public_key: &Digest, signature: &[u8], message: Digest) -> bool {
        signature == Self::sign(*public_key, message).as_slice()
    }
}

/// Returns a verifier using [`MockSignatureScheme`].
pub fn mock_verifier(config: VerifierConfig) -> TransactionVerifier<MockSignatureScheme> {
    TransactionVerifier::new(MockSignatureScheme, config)
}

// ACCOUNTS
// ================================================================================================

/// Returns the public key of the mock account with the given index.
pub fn mock_public_key(account_index: AccountIndex) -> Digest {
    Hasher::hash_elements(&[Felt::from(account_index.as_u32())])
}

/// Returns an account with a mock public key and no assets.
///
/// # Panics
/// Panics if `name` is not a valid account name.
pub fn mock_account(account_index: u32, name: &str) -> AccountState {
    let account_index = AccountIndex::new(account_index);
    AccountState::new(account_index, name, mock_public_key(account_index))
        .expect("mock account name should be valid")
}

/// Returns a mock account holding the given balances.
pub fn funded_account(account_index: u32, name: &str, balances: &[(u32, u64)]) -> AccountState {
    balances.iter().fold(mock_account(account_index, name), |account, (asset_id, balance)| {
        account.with_asset(AssetId::new(*asset_id), AccountAsset::with_balance(*balance))
    })
}

// SIGNING
// ================================================================================================

/// Signs a transaction with the mock key of its originating account.
///
/// Priority operations are returned unchanged.
pub fn sign_tx(mut tx: TransactionInfo) -> TransactionInfo {
    let Some(account_index) = tx.account_index() else {
        return tx;
    };
    let message = Hasher::hash_elements(tx.signing_fields().as_elements());
    let signature = MockSignatureScheme::sign(mock_public_key(account_index), message);

    match &mut tx {
        TransactionInfo::Register(_)
        | TransactionInfo::CreatePair(_)
        | TransactionInfo::Deposit(_)
        | TransactionInfo::DepositNft(_)
        | TransactionInfo::FullExit(_)
        | TransactionInfo::FullExitNft(_) => (),
        TransactionInfo::Transfer(inner) => inner.signature = signature,
        TransactionInfo::Swap(inner) => inner.signature = signature,
        TransactionInfo::AddLiquidity(inner) => inner.signature = signature,
        TransactionInfo::RemoveLiquidity(inner) => inner.signature = signature,
        TransactionInfo::Withdraw(inner) => inner.signature = signature,
        TransactionInfo::CreateCollection(inner) => inner.signature = signature,
        TransactionInfo::MintNft(inner) => inner.signature = signature,
        TransactionInfo::TransferNft(inner) => inner.signature = signature,
        TransactionInfo::AtomicMatch(inner) => inner.signature = signature,
        TransactionInfo::CancelOffer(inner) => inner.signature = signature,
        TransactionInfo::WithdrawNft(inner) => inner.signature = signature,
    }
    tx
}

/// Signs an offer with the mock key of its maker.
pub fn sign_offer(mut offer: Offer) -> Offer {
    let mut writer = ElementWriter::new();
    offer.write_elements(&mut writer);
    let message = Hasher::hash_elements(writer.as_elements());
    offer.signature = MockSignatureScheme::sign(mock_public_key(offer.account_index), message);
    offer
}

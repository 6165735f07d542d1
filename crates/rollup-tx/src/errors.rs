use rollup_objects::{
    AccountError, AmountError, BigUint,
    account::{AccountIndex, AssetId, NftIndex, PairIndex},
    transaction::DetailKey,
};
use thiserror::Error;

// VERIFIER ERROR KIND
// ================================================================================================

/// Coarse classification of verification failures.
///
/// - `Structural` errors are caused by malformed or inconsistent transaction data and are never
///   retried.
/// - `NonceMismatch` requires the sender to resynchronize its nonce.
/// - `InvalidSignature` is fatal for the transaction.
/// - `InsufficientBalance` may go away once the state changes; resubmission is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerifierErrorKind {
    Structural,
    NonceMismatch,
    InvalidSignature,
    InsufficientBalance,
}

// VERIFIER ERROR
// ================================================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifierError {
    #[error("account {0} is not part of the state snapshot")]
    MissingAccount(AccountIndex),
    #[error("account {account_index} has no entry for asset {asset_id}")]
    MissingAsset {
        account_index: AccountIndex,
        asset_id: AssetId,
    },
    #[error("liquidity pool {0} does not exist")]
    MissingPool(PairIndex),
    #[error("nft {0} does not exist")]
    MissingNft(NftIndex),
    #[error("account {0} already exists")]
    AccountAlreadyExists(AccountIndex),
    #[error("liquidity pool {0} already exists")]
    PoolAlreadyExists(PairIndex),
    #[error("nft {0} already exists")]
    NftAlreadyExists(NftIndex),
    #[error("account name hash does not match the name of account {0}")]
    AccountNameHashMismatch(AccountIndex),
    #[error("invalid account name")]
    InvalidAccountName(#[source] AccountError),
    #[error("amount out of range")]
    AmountOutOfRange(#[source] AmountError),
    #[error("invalid transaction payload: {0}")]
    InvalidPayload(&'static str),
    #[error("nft {nft_index} is not owned by account {account_index}")]
    NftNotOwned {
        nft_index: NftIndex,
        account_index: AccountIndex,
    },
    #[error("offer {offer_id} of account {account_index} was already canceled or finalized")]
    OfferAlreadyFinalized {
        account_index: AccountIndex,
        offer_id: u64,
    },
    #[error("expected nonce {expected} for account {account_index} but transaction has {actual}")]
    NonceMismatch {
        account_index: AccountIndex,
        expected: u64,
        actual: u64,
    },
    #[error("signature of account {0} is not valid")]
    InvalidSignature(AccountIndex),
    #[error(
        "account {account_index} holds {balance} of asset {asset_id} but {required} is required"
    )]
    InsufficientBalance {
        account_index: AccountIndex,
        asset_id: AssetId,
        balance: BigUint,
        required: BigUint,
    },
    #[error(
        "account {account_index} holds {lp_amount} shares of pool {pair_index} but {required} are \
         required"
    )]
    InsufficientLpAmount {
        account_index: AccountIndex,
        pair_index: PairIndex,
        lp_amount: BigUint,
        required: BigUint,
    },
    #[error("liquidity pool {0} has insufficient reserves")]
    InsufficientLiquidity(PairIndex),
    #[error("output amount {actual} is below the requested minimum of {minimum}")]
    SlippageExceeded { minimum: BigUint, actual: BigUint },
}

impl VerifierError {
    /// Returns the class of this error.
    pub fn kind(&self) -> VerifierErrorKind {
        match self {
            Self::NonceMismatch { .. } => VerifierErrorKind::NonceMismatch,
            Self::InvalidSignature(_) => VerifierErrorKind::InvalidSignature,
            Self::InsufficientBalance { .. }
            | Self::InsufficientLpAmount { .. }
            | Self::InsufficientLiquidity(_)
            | Self::SlippageExceeded { .. } => VerifierErrorKind::InsufficientBalance,
            Self::MissingAccount(_)
            | Self::MissingAsset { .. }
            | Self::MissingPool(_)
            | Self::MissingNft(_)
            | Self::AccountAlreadyExists(_)
            | Self::PoolAlreadyExists(_)
            | Self::NftAlreadyExists(_)
            | Self::AccountNameHashMismatch(_)
            | Self::InvalidAccountName(_)
            | Self::AmountOutOfRange(_)
            | Self::InvalidPayload(_)
            | Self::NftNotOwned { .. }
            | Self::OfferAlreadyFinalized { .. } => VerifierErrorKind::Structural,
        }
    }
}

// BALANCE ERROR
// ================================================================================================

/// Errors raised while applying detail records to the account state. Nothing is applied when one
/// of these is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BalanceError {
    #[error("balance of asset {asset_id} of account {account_index} would become negative")]
    NegativeBalance {
        account_index: AccountIndex,
        asset_id: AssetId,
    },
    #[error("share of pool {pair_index} of account {account_index} would become negative")]
    NegativeLpAmount {
        account_index: AccountIndex,
        pair_index: PairIndex,
    },
    #[error("reserves of liquidity pool {0} would become negative")]
    NegativeReserve(PairIndex),
    #[error("amount stored under {0:?} would exceed the state amount range")]
    AmountOverflow(DetailKey),
    #[error("account {0} does not exist")]
    UnknownAccount(AccountIndex),
    #[error("liquidity pool {0} does not exist")]
    UnknownPool(PairIndex),
}

// REGISTRY ERROR
// ================================================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("failed to apply transaction details")]
    Balance(#[from] BalanceError),
    #[error("account {account_index} has nonce {actual} but the transaction expects {expected}")]
    StaleNonce {
        account_index: AccountIndex,
        expected: u64,
        actual: u64,
    },
    #[error("account {0} does not exist")]
    UnknownAccount(AccountIndex),
    #[error("expected the next account index to be {expected} but got {actual}")]
    NonSequentialAccountIndex {
        expected: AccountIndex,
        actual: AccountIndex,
    },
    #[error("account {0} already exists")]
    AccountAlreadyExists(AccountIndex),
    #[error("liquidity pool {0} already exists")]
    PoolAlreadyExists(PairIndex),
}

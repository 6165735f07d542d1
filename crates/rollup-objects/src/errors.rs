use num_bigint::BigUint;
use thiserror::Error;

use crate::{MAX_ACCOUNT_NAME_LENGTH, STATE_AMOUNT_BITS};

// ACCOUNT ERROR
// ================================================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("account name must not be empty")]
    EmptyAccountName,
    #[error(
        "account name is {0} bytes long but may be at most {max} bytes",
        max = MAX_ACCOUNT_NAME_LENGTH
    )]
    AccountNameTooLong(usize),
    #[error("account name contains invalid character {0:?}")]
    InvalidAccountNameCharacter(char),
}

// AMOUNT ERROR
// ================================================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount {0} does not fit into {bits} bits", bits = STATE_AMOUNT_BITS)]
    AmountTooLarge(BigUint),
    #[error("nft index {0} does not fit into {bits} bits", bits = crate::NFT_INDEX_BITS)]
    NftIndexTooLarge(u64),
    #[error("rate {0} exceeds the rate base of {base}", base = crate::RATE_BASE)]
    RateTooLarge(u16),
}

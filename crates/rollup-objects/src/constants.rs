/// Number of offers tracked by the offer bitmap of a single asset slot.
///
/// Offer `id` lives in the bitmap of asset `id / OFFERS_PER_ASSET` at bit `id % OFFERS_PER_ASSET`.
pub const OFFERS_PER_ASSET: u64 = 128;

/// Bit width of state amounts (balances, lp amounts, pool reserves, transaction amounts).
pub const STATE_AMOUNT_BITS: u64 = 128;

/// Denominator of all fee and treasury rates.
pub const RATE_BASE: u32 = 10_000;

/// Maximum length of an account name, in bytes.
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 30;

/// Bit width of NFT indices.
pub const NFT_INDEX_BITS: u32 = 40;

// PUBDATA FIELD WIDTHS
// ================================================================================================

pub const TX_TYPE_BYTES: usize = 1;
pub const ACCOUNT_INDEX_BYTES: usize = 4;
pub const ACCOUNT_NAME_HASH_BYTES: usize = 32;
pub const PUBLIC_KEY_BYTES: usize = 32;
pub const ASSET_ID_BYTES: usize = 4;
pub const PAIR_INDEX_BYTES: usize = 2;
pub const STATE_AMOUNT_BYTES: usize = 16;
pub const NFT_INDEX_BYTES: usize = 5;
pub const OFFER_ID_BYTES: usize = 5;
pub const NFT_CONTENT_HASH_BYTES: usize = 32;
pub const ADDRESS_BYTES: usize = 20;
pub const RATE_BYTES: usize = 2;
pub const COLLECTION_ID_BYTES: usize = 4;

// WITNESS LAYOUT
// ================================================================================================

/// Number of field elements reserved for the signing fields of one transaction.
pub const MAX_TX_FIELDS: usize = 64;

/// Maximum number of detail records a single transaction can emit.
pub const MAX_DETAILS_PER_TX: usize = 10;

/// Number of field elements encoding one state value (pre or post) in the witness.
pub const STATE_VALUE_WIDTH: usize = 12;

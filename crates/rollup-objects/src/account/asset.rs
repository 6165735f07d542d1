use core::fmt;

use num_bigint::BigUint;
use num_traits::Zero;

use crate::{
    AmountError, OFFERS_PER_ASSET, STATE_AMOUNT_BITS,
    elements::ElementWriter,
    utils::{
        read_amount,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
        write_amount,
    },
};

// ASSET ID
// ================================================================================================

/// Identifier of a fungible asset tracked per account.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(u32);

impl AssetId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the asset slot and bit position holding the given offer in the offer bitmap.
    ///
    /// Returns `None` if the offer id maps to an asset id outside of the `u32` range.
    pub fn for_offer(offer_id: u64) -> Option<(AssetId, u64)> {
        let asset = u32::try_from(offer_id / OFFERS_PER_ASSET).ok()?;
        Some((AssetId(asset), offer_id % OFFERS_PER_ASSET))
    }
}

impl From<u32> for AssetId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serializable for AssetId {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u32(self.0);
    }
}

impl Deserializable for AssetId {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        source.read_u32().map(Self)
    }
}

/// Checks that an amount fits into [`STATE_AMOUNT_BITS`] bits.
pub fn validate_amount(amount: &BigUint) -> Result<(), AmountError> {
    if amount.bits() > STATE_AMOUNT_BITS {
        return Err(AmountError::AmountTooLarge(amount.clone()));
    }
    Ok(())
}

// ASSET TYPE
// ================================================================================================

/// The kind of state a transaction detail record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum AssetType {
    /// A fungible balance (and offer bitmap) of an account.
    General = 0,
    /// The reserves of a liquidity pool.
    Liquidity = 1,
    /// An account's share of a liquidity pool.
    LiquidityLp = 2,
    /// A non-fungible token.
    Nft = 3,
}

impl AssetType {
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }
}

// ACCOUNT ASSET
// ================================================================================================

/// The state of one asset slot of an account.
///
/// - `balance` is the fungible balance of the asset.
/// - `lp_amount` is the account's share of the liquidity pool whose pair index equals the slot id.
/// - `offer_bitmap` records canceled or finalized offers: bit `i` is set once offer
///   `slot * OFFERS_PER_ASSET + i` can no longer be matched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AccountAsset {
    pub balance: BigUint,
    pub lp_amount: BigUint,
    pub offer_bitmap: BigUint,
}

impl AccountAsset {
    /// Returns an asset slot holding only the provided balance.
    pub fn with_balance(balance: impl Into<BigUint>) -> Self {
        Self { balance: balance.into(), ..Default::default() }
    }

    /// Returns true if every field of this slot is zero.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.lp_amount.is_zero() && self.offer_bitmap.is_zero()
    }

    /// Returns true if the bit of the offer at `offer_bit` is set.
    pub fn is_offer_finalized(&self, offer_bit: u64) -> bool {
        self.offer_bitmap.bit(offer_bit)
    }

    /// Writes the field element encoding of this slot: balance, lp amount and offer bitmap.
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_amount(&self.balance)
            .push_amount(&self.lp_amount)
            .push_amount(&self.offer_bitmap);
    }
}

impl Serializable for AccountAsset {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        write_amount(target, &self.balance);
        write_amount(target, &self.lp_amount);
        write_amount(target, &self.offer_bitmap);
    }
}

impl Deserializable for AccountAsset {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let balance = read_amount(source)?;
        let lp_amount = read_amount(source)?;
        let offer_bitmap = read_amount(source)?;
        Ok(Self { balance, lp_amount, offer_bitmap })
    }
}

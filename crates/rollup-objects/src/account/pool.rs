use core::fmt;

use num_bigint::BigUint;

use super::AssetId;
use crate::{
    Digest, Hasher,
    elements::ElementWriter,
    utils::{
        read_amount,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
        write_amount,
    },
};

// PAIR INDEX
// ================================================================================================

/// Identifier of a liquidity pool.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairIndex(u16);

impl PairIndex {
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the account asset slot holding lp shares of this pool.
    pub const fn lp_asset_id(&self) -> AssetId {
        AssetId::new(self.0 as u32)
    }
}

impl From<u16> for PairIndex {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for PairIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serializable for PairIndex {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u16(self.0);
    }
}

impl Deserializable for PairIndex {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        source.read_u16().map(Self)
    }
}

// LIQUIDITY POOL
// ================================================================================================

/// A constant-product liquidity pool between two assets.
///
/// `fee_rate` is expressed in units of [`crate::RATE_BASE`] and is charged on swap inputs; the fee
/// stays in the pool reserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityPool {
    pub pair_index: PairIndex,
    pub asset_a_id: AssetId,
    pub asset_a: BigUint,
    pub asset_b_id: AssetId,
    pub asset_b: BigUint,
    pub lp_amount: BigUint,
    pub fee_rate: u16,
}

impl LiquidityPool {
    /// Returns a new pool without any reserves.
    pub fn new(
        pair_index: PairIndex,
        asset_a_id: AssetId,
        asset_b_id: AssetId,
        fee_rate: u16,
    ) -> Self {
        Self {
            pair_index,
            asset_a_id,
            asset_a: BigUint::default(),
            asset_b_id,
            asset_b: BigUint::default(),
            lp_amount: BigUint::default(),
            fee_rate,
        }
    }

    /// Returns the reserves ordered as `(asset_in, asset_out)` for a swap from `asset_in_id` to
    /// `asset_out_id`, or `None` if the ids do not match this pool's pair.
    pub fn oriented_reserves(
        &self,
        asset_in_id: AssetId,
        asset_out_id: AssetId,
    ) -> Option<(&BigUint, &BigUint)> {
        if asset_in_id == self.asset_a_id && asset_out_id == self.asset_b_id {
            Some((&self.asset_a, &self.asset_b))
        } else if asset_in_id == self.asset_b_id && asset_out_id == self.asset_a_id {
            Some((&self.asset_b, &self.asset_a))
        } else {
            None
        }
    }

    /// Writes the field element encoding of the pool's reserves and lp supply.
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_amount(&self.asset_a)
            .push_amount(&self.asset_b)
            .push_amount(&self.lp_amount);
    }

    /// Returns the commitment to the full pool state.
    pub fn commitment(&self) -> Digest {
        let mut writer = ElementWriter::new();
        writer
            .push_u32(self.pair_index.as_u16() as u32)
            .push_u32(self.asset_a_id.as_u32())
            .push_u32(self.asset_b_id.as_u32())
            .push_u32(self.fee_rate as u32);
        self.write_elements(&mut writer);
        Hasher::hash_elements(writer.as_elements())
    }
}

impl Serializable for LiquidityPool {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.pair_index.write_into(target);
        self.asset_a_id.write_into(target);
        write_amount(target, &self.asset_a);
        self.asset_b_id.write_into(target);
        write_amount(target, &self.asset_b);
        write_amount(target, &self.lp_amount);
        target.write_u16(self.fee_rate);
    }
}

impl Deserializable for LiquidityPool {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            pair_index: source.read()?,
            asset_a_id: source.read()?,
            asset_a: read_amount(source)?,
            asset_b_id: source.read()?,
            asset_b: read_amount(source)?,
            lp_amount: read_amount(source)?,
            fee_rate: source.read_u16()?,
        })
    }
}

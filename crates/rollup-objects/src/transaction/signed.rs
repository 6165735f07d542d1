use alloc::vec::Vec;

use num_bigint::BigUint;

use crate::{
    ADDRESS_BYTES, Digest,
    account::{AccountIndex, AssetId, PairIndex},
    elements::ElementWriter,
    utils::{
        read_amount,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
        write_amount,
    },
};

/// Address of an account on the base chain.
pub type L1Address = [u8; ADDRESS_BYTES];

// GAS FEE
// ================================================================================================

/// The fee paid by the originator of a signed transaction to the gas account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasFee {
    pub gas_account_index: AccountIndex,
    pub asset_id: AssetId,
    pub amount: BigUint,
}

impl GasFee {
    pub fn new(
        gas_account_index: AccountIndex,
        asset_id: AssetId,
        amount: impl Into<BigUint>,
    ) -> Self {
        Self { gas_account_index, asset_id, amount: amount.into() }
    }

    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.gas_account_index.as_u32())
            .push_u32(self.asset_id.as_u32())
            .push_amount(&self.amount);
    }
}

impl Serializable for GasFee {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.gas_account_index.write_into(target);
        self.asset_id.write_into(target);
        write_amount(target, &self.amount);
    }
}

impl Deserializable for GasFee {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            gas_account_index: source.read()?,
            asset_id: source.read()?,
            amount: read_amount(source)?,
        })
    }
}

// SIGNED FUNGIBLE OPERATIONS
// ================================================================================================

/// Moves an amount of one asset between two accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTx {
    pub account_index: AccountIndex,
    pub to_account_index: AccountIndex,
    pub to_account_name_hash: Digest,
    pub asset_id: AssetId,
    pub amount: BigUint,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

/// Sells `asset_a_amount` of `asset_a_id` to a pool for at least `asset_b_min_amount` of
/// `asset_b_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapTx {
    pub account_index: AccountIndex,
    pub pair_index: PairIndex,
    pub asset_a_id: AssetId,
    pub asset_a_amount: BigUint,
    pub asset_b_id: AssetId,
    pub asset_b_min_amount: BigUint,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

/// Deposits up to the given amounts of both pool assets in exchange for pool shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityTx {
    pub account_index: AccountIndex,
    pub pair_index: PairIndex,
    pub asset_a_amount: BigUint,
    pub asset_b_amount: BigUint,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

/// Burns pool shares in exchange for a pro-rata part of the pool reserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityTx {
    pub account_index: AccountIndex,
    pub pair_index: PairIndex,
    pub lp_amount: BigUint,
    pub asset_a_min_amount: BigUint,
    pub asset_b_min_amount: BigUint,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

/// Withdraws an amount of one asset to an address on the base chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawTx {
    pub account_index: AccountIndex,
    pub asset_id: AssetId,
    pub amount: BigUint,
    pub to_address: L1Address,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

// FIELD ENCODING
// ================================================================================================

impl TransferTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_u32(self.to_account_index.as_u32())
            .push_digest(self.to_account_name_hash)
            .push_u32(self.asset_id.as_u32())
            .push_amount(&self.amount);
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

impl SwapTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_u32(self.pair_index.as_u16() as u32)
            .push_u32(self.asset_a_id.as_u32())
            .push_amount(&self.asset_a_amount)
            .push_u32(self.asset_b_id.as_u32())
            .push_amount(&self.asset_b_min_amount);
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

impl AddLiquidityTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_u32(self.pair_index.as_u16() as u32)
            .push_amount(&self.asset_a_amount)
            .push_amount(&self.asset_b_amount);
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

impl RemoveLiquidityTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_u32(self.pair_index.as_u16() as u32)
            .push_amount(&self.lp_amount)
            .push_amount(&self.asset_a_min_amount)
            .push_amount(&self.asset_b_min_amount);
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

impl WithdrawTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_u32(self.asset_id.as_u32())
            .push_amount(&self.amount)
            .push_bytes(&self.to_address);
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

// SERIALIZATION
// ================================================================================================

impl Serializable for TransferTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.to_account_index.write_into(target);
        self.to_account_name_hash.write_into(target);
        self.asset_id.write_into(target);
        write_amount(target, &self.amount);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for TransferTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            to_account_index: source.read()?,
            to_account_name_hash: source.read()?,
            asset_id: source.read()?,
            amount: read_amount(source)?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

impl Serializable for SwapTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.pair_index.write_into(target);
        self.asset_a_id.write_into(target);
        write_amount(target, &self.asset_a_amount);
        self.asset_b_id.write_into(target);
        write_amount(target, &self.asset_b_min_amount);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for SwapTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            pair_index: source.read()?,
            asset_a_id: source.read()?,
            asset_a_amount: read_amount(source)?,
            asset_b_id: source.read()?,
            asset_b_min_amount: read_amount(source)?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

impl Serializable for AddLiquidityTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.pair_index.write_into(target);
        write_amount(target, &self.asset_a_amount);
        write_amount(target, &self.asset_b_amount);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for AddLiquidityTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            pair_index: source.read()?,
            asset_a_amount: read_amount(source)?,
            asset_b_amount: read_amount(source)?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

impl Serializable for RemoveLiquidityTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.pair_index.write_into(target);
        write_amount(target, &self.lp_amount);
        write_amount(target, &self.asset_a_min_amount);
        write_amount(target, &self.asset_b_min_amount);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for RemoveLiquidityTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            pair_index: source.read()?,
            lp_amount: read_amount(source)?,
            asset_a_min_amount: read_amount(source)?,
            asset_b_min_amount: read_amount(source)?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

impl Serializable for WithdrawTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.asset_id.write_into(target);
        write_amount(target, &self.amount);
        target.write_bytes(&self.to_address);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for WithdrawTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            asset_id: source.read()?,
            amount: read_amount(source)?,
            to_address: source.read_array()?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

use alloc::string::String;

use num_bigint::BigUint;

use crate::{
    Digest,
    account::{AccountIndex, AssetId, NftIndex, PairIndex},
    elements::ElementWriter,
    utils::{
        read_amount, read_string,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
        write_amount, write_string,
    },
};

// PRIORITY OPERATIONS
// ================================================================================================
//
// Priority operations are requested on the base chain and relayed to the rollup in order. They
// are authenticated by the base chain, so they carry neither a nonce nor a signature and never
// pay a gas fee.

/// Registers a new account under the next free account index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterTx {
    pub account_index: AccountIndex,
    pub account_name: String,
    pub public_key: Digest,
}

/// Creates an empty liquidity pool between two assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePairTx {
    pub pair_index: PairIndex,
    pub asset_a_id: AssetId,
    pub asset_b_id: AssetId,
    pub fee_rate: u16,
}

/// Credits an account with assets locked on the base chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositTx {
    pub account_index: AccountIndex,
    pub account_name_hash: Digest,
    pub asset_id: AssetId,
    pub amount: BigUint,
}

/// Brings an NFT locked on the base chain back into the rollup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositNftTx {
    pub account_index: AccountIndex,
    pub account_name_hash: Digest,
    pub nft_index: NftIndex,
    pub creator_account_index: AccountIndex,
    pub content_hash: Digest,
    pub collection_id: u32,
    pub creator_treasury_rate: u16,
}

/// Forces the withdrawal of an account's entire balance of one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullExitTx {
    pub account_index: AccountIndex,
    pub account_name_hash: Digest,
    pub asset_id: AssetId,
}

/// Forces the withdrawal of an NFT held by an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullExitNftTx {
    pub account_index: AccountIndex,
    pub account_name_hash: Digest,
    pub nft_index: NftIndex,
}

// FIELD ENCODING
// ================================================================================================

impl RegisterTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_digest(crate::account::account_name_hash(&self.account_name))
            .push_digest(self.public_key);
    }
}

impl CreatePairTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.pair_index.as_u16() as u32)
            .push_u32(self.asset_a_id.as_u32())
            .push_u32(self.asset_b_id.as_u32())
            .push_u32(self.fee_rate as u32);
    }
}

impl DepositTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_digest(self.account_name_hash)
            .push_u32(self.asset_id.as_u32())
            .push_amount(&self.amount);
    }
}

impl DepositNftTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_digest(self.account_name_hash)
            .push_u64(self.nft_index.as_u64())
            .push_u32(self.creator_account_index.as_u32())
            .push_digest(self.content_hash)
            .push_u32(self.collection_id)
            .push_u32(self.creator_treasury_rate as u32);
    }
}

impl FullExitTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_digest(self.account_name_hash)
            .push_u32(self.asset_id.as_u32());
    }
}

impl FullExitNftTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_digest(self.account_name_hash)
            .push_u64(self.nft_index.as_u64());
    }
}

// SERIALIZATION
// ================================================================================================

impl Serializable for RegisterTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        write_string(target, &self.account_name);
        self.public_key.write_into(target);
    }
}

impl Deserializable for RegisterTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            account_name: read_string(source)?,
            public_key: source.read()?,
        })
    }
}

impl Serializable for CreatePairTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.pair_index.write_into(target);
        self.asset_a_id.write_into(target);
        self.asset_b_id.write_into(target);
        target.write_u16(self.fee_rate);
    }
}

impl Deserializable for CreatePairTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            pair_index: source.read()?,
            asset_a_id: source.read()?,
            asset_b_id: source.read()?,
            fee_rate: source.read_u16()?,
        })
    }
}

impl Serializable for DepositTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.account_name_hash.write_into(target);
        self.asset_id.write_into(target);
        write_amount(target, &self.amount);
    }
}

impl Deserializable for DepositTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            account_name_hash: source.read()?,
            asset_id: source.read()?,
            amount: read_amount(source)?,
        })
    }
}

impl Serializable for DepositNftTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.account_name_hash.write_into(target);
        self.nft_index.write_into(target);
        self.creator_account_index.write_into(target);
        self.content_hash.write_into(target);
        target.write_u32(self.collection_id);
        target.write_u16(self.creator_treasury_rate);
    }
}

impl Deserializable for DepositNftTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            account_name_hash: source.read()?,
            nft_index: source.read()?,
            creator_account_index: source.read()?,
            content_hash: source.read()?,
            collection_id: source.read_u32()?,
            creator_treasury_rate: source.read_u16()?,
        })
    }
}

impl Serializable for FullExitTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.account_name_hash.write_into(target);
        self.asset_id.write_into(target);
    }
}

impl Deserializable for FullExitTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            account_name_hash: source.read()?,
            asset_id: source.read()?,
        })
    }
}

impl Serializable for FullExitNftTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.account_name_hash.write_into(target);
        self.nft_index.write_into(target);
    }
}

impl Deserializable for FullExitNftTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            account_name_hash: source.read()?,
            nft_index: source.read()?,
        })
    }
}

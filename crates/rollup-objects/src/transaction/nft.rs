use alloc::vec::Vec;

use num_bigint::BigUint;

use super::{GasFee, L1Address};
use crate::{
    Digest,
    account::{AccountIndex, AssetId, NftIndex},
    elements::ElementWriter,
    utils::{
        read_amount,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
        write_amount,
    },
};

// SIGNED NFT OPERATIONS
// ================================================================================================

/// Creates the NFT collection with id `collection_id`, which must equal the account's collection
/// nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCollectionTx {
    pub account_index: AccountIndex,
    pub collection_id: u32,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

/// Mints a new NFT into an empty slot on behalf of its creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintNftTx {
    pub account_index: AccountIndex,
    pub to_account_index: AccountIndex,
    pub to_account_name_hash: Digest,
    pub nft_index: NftIndex,
    pub content_hash: Digest,
    pub collection_id: u32,
    pub creator_treasury_rate: u16,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

/// Hands an NFT over to another account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferNftTx {
    pub account_index: AccountIndex,
    pub to_account_index: AccountIndex,
    pub to_account_name_hash: Digest,
    pub nft_index: NftIndex,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

/// Withdraws an NFT to an address on the base chain, clearing its rollup slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawNftTx {
    pub account_index: AccountIndex,
    pub nft_index: NftIndex,
    pub to_address: L1Address,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

/// Marks an offer as canceled so that it can never be matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOfferTx {
    pub account_index: AccountIndex,
    pub offer_id: u64,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

// OFFERS
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OfferType {
    Buy = 0,
    Sell = 1,
}

impl TryFrom<u8> for OfferType {
    type Error = DeserializationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Buy),
            1 => Ok(Self::Sell),
            _ => Err(DeserializationError::InvalidValue(format!("unknown offer type {value}"))),
        }
    }
}

/// An off-chain order to buy or sell an NFT for an amount of one asset.
///
/// Offers are signed by their maker independently of the transaction that matches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub offer_type: OfferType,
    pub offer_id: u64,
    pub account_index: AccountIndex,
    pub nft_index: NftIndex,
    pub asset_id: AssetId,
    pub asset_amount: BigUint,
    pub treasury_rate: u16,
    pub signature: Vec<u8>,
}

impl Offer {
    /// Writes every field of the offer except for its signature.
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.offer_type as u32)
            .push_u64(self.offer_id)
            .push_u32(self.account_index.as_u32())
            .push_u64(self.nft_index.as_u64())
            .push_u32(self.asset_id.as_u32())
            .push_amount(&self.asset_amount)
            .push_u32(self.treasury_rate as u32);
    }
}

/// Settles a sell offer against a buy offer for the same NFT.
///
/// The transaction is submitted (and paid for) by `account_index`, which need not be either maker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicMatchTx {
    pub account_index: AccountIndex,
    pub buy_offer: Offer,
    pub sell_offer: Offer,
    pub gas: GasFee,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

// FIELD ENCODING
// ================================================================================================

impl CreateCollectionTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer.push_u32(self.account_index.as_u32()).push_u32(self.collection_id);
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

impl MintNftTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_u32(self.to_account_index.as_u32())
            .push_digest(self.to_account_name_hash)
            .push_u64(self.nft_index.as_u64())
            .push_digest(self.content_hash)
            .push_u32(self.collection_id)
            .push_u32(self.creator_treasury_rate as u32);
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

impl TransferNftTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_u32(self.to_account_index.as_u32())
            .push_digest(self.to_account_name_hash)
            .push_u64(self.nft_index.as_u64());
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

impl WithdrawNftTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer
            .push_u32(self.account_index.as_u32())
            .push_u64(self.nft_index.as_u64())
            .push_bytes(&self.to_address);
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

impl CancelOfferTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer.push_u32(self.account_index.as_u32()).push_u64(self.offer_id);
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

impl AtomicMatchTx {
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        writer.push_u32(self.account_index.as_u32());
        self.buy_offer.write_elements(writer);
        self.sell_offer.write_elements(writer);
        self.gas.write_elements(writer);
        writer.push_u64(self.nonce);
    }
}

// SERIALIZATION
// ================================================================================================

impl Serializable for CreateCollectionTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        target.write_u32(self.collection_id);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for CreateCollectionTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            collection_id: source.read_u32()?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

impl Serializable for MintNftTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.to_account_index.write_into(target);
        self.to_account_name_hash.write_into(target);
        self.nft_index.write_into(target);
        self.content_hash.write_into(target);
        target.write_u32(self.collection_id);
        target.write_u16(self.creator_treasury_rate);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for MintNftTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            to_account_index: source.read()?,
            to_account_name_hash: source.read()?,
            nft_index: source.read()?,
            content_hash: source.read()?,
            collection_id: source.read_u32()?,
            creator_treasury_rate: source.read_u16()?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

impl Serializable for TransferNftTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.to_account_index.write_into(target);
        self.to_account_name_hash.write_into(target);
        self.nft_index.write_into(target);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for TransferNftTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            to_account_index: source.read()?,
            to_account_name_hash: source.read()?,
            nft_index: source.read()?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

impl Serializable for WithdrawNftTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.nft_index.write_into(target);
        target.write_bytes(&self.to_address);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for WithdrawNftTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            nft_index: source.read()?,
            to_address: source.read_array()?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

impl Serializable for CancelOfferTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        target.write_u64(self.offer_id);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for CancelOfferTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            offer_id: source.read_u64()?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

impl Serializable for Offer {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(self.offer_type as u8);
        target.write_u64(self.offer_id);
        self.account_index.write_into(target);
        self.nft_index.write_into(target);
        self.asset_id.write_into(target);
        write_amount(target, &self.asset_amount);
        target.write_u16(self.treasury_rate);
        self.signature.write_into(target);
    }
}

impl Deserializable for Offer {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            offer_type: OfferType::try_from(source.read_u8()?)?,
            offer_id: source.read_u64()?,
            account_index: source.read()?,
            nft_index: source.read()?,
            asset_id: source.read()?,
            asset_amount: read_amount(source)?,
            treasury_rate: source.read_u16()?,
            signature: source.read()?,
        })
    }
}

impl Serializable for AtomicMatchTx {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        self.buy_offer.write_into(target);
        self.sell_offer.write_into(target);
        self.gas.write_into(target);
        target.write_u64(self.nonce);
        self.signature.write_into(target);
    }
}

impl Deserializable for AtomicMatchTx {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            buy_offer: source.read()?,
            sell_offer: source.read()?,
            gas: source.read()?,
            nonce: source.read_u64()?,
            signature: source.read()?,
        })
    }
}

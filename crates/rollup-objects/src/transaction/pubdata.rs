use alloc::vec::Vec;

use num_bigint::BigUint;

use super::{L1Address, TxType};
use crate::{
    ACCOUNT_INDEX_BYTES, ASSET_ID_BYTES, COLLECTION_ID_BYTES, Digest, NFT_INDEX_BYTES,
    OFFER_ID_BYTES, PAIR_INDEX_BYTES, RATE_BYTES, STATE_AMOUNT_BYTES,
    account::{AccountIndex, AssetId, NftIndex, PairIndex},
};

// PUBDATA BUILDER
// ================================================================================================

/// Builds the public data a transaction commits to the base chain.
///
/// Every field is written big-endian with a fixed width, so the layout of each transaction type
/// is fully determined by its type tag.
#[derive(Debug, Clone)]
pub struct PubdataBuilder {
    bytes: Vec<u8>,
}

impl PubdataBuilder {
    pub fn new(tx_type: TxType) -> Self {
        Self { bytes: vec![tx_type.as_u8()] }
    }

    pub fn account_index(mut self, index: AccountIndex) -> Self {
        self.push_fixed(&index.as_u32().to_be_bytes(), ACCOUNT_INDEX_BYTES);
        self
    }

    pub fn asset_id(mut self, asset_id: AssetId) -> Self {
        self.push_fixed(&asset_id.as_u32().to_be_bytes(), ASSET_ID_BYTES);
        self
    }

    pub fn pair_index(mut self, pair_index: PairIndex) -> Self {
        self.push_fixed(&pair_index.as_u16().to_be_bytes(), PAIR_INDEX_BYTES);
        self
    }

    /// Appends a state amount. Amounts must have been range-checked beforehand; only the low
    /// [`STATE_AMOUNT_BYTES`] bytes are kept.
    pub fn amount(mut self, amount: &BigUint) -> Self {
        self.push_fixed(&amount.to_bytes_be(), STATE_AMOUNT_BYTES);
        self
    }

    pub fn nft_index(mut self, nft_index: NftIndex) -> Self {
        self.push_fixed(&nft_index.as_u64().to_be_bytes(), NFT_INDEX_BYTES);
        self
    }

    pub fn offer_id(mut self, offer_id: u64) -> Self {
        self.push_fixed(&offer_id.to_be_bytes(), OFFER_ID_BYTES);
        self
    }

    pub fn rate(mut self, rate: u16) -> Self {
        self.push_fixed(&rate.to_be_bytes(), RATE_BYTES);
        self
    }

    pub fn collection_id(mut self, collection_id: u32) -> Self {
        self.push_fixed(&collection_id.to_be_bytes(), COLLECTION_ID_BYTES);
        self
    }

    pub fn digest(mut self, digest: Digest) -> Self {
        self.bytes.extend_from_slice(&digest.as_bytes());
        self
    }

    pub fn address(mut self, address: &L1Address) -> Self {
        self.bytes.extend_from_slice(address);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    /// Appends the low `width` bytes of a big-endian value, left-padding with zeros.
    fn push_fixed(&mut self, be_bytes: &[u8], width: usize) {
        if be_bytes.len() >= width {
            self.bytes.extend_from_slice(&be_bytes[be_bytes.len() - width..]);
        } else {
            self.bytes.resize(self.bytes.len() + width - be_bytes.len(), 0);
            self.bytes.extend_from_slice(be_bytes);
        }
    }
}

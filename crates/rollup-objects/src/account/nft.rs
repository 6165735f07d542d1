use core::fmt;

use super::AccountIndex;
use crate::{
    AmountError, Digest, Hasher, NFT_INDEX_BITS,
    elements::ElementWriter,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// NFT INDEX
// ================================================================================================

/// Identifier of a non-fungible token. Valid indices fit into [`NFT_INDEX_BITS`] bits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NftIndex(u64);

impl NftIndex {
    pub const MAX: u64 = (1 << NFT_INDEX_BITS) - 1;

    /// Returns a new [`NftIndex`].
    ///
    /// # Errors
    /// Returns an error if the index does not fit into [`NFT_INDEX_BITS`] bits.
    pub fn new(index: u64) -> Result<Self, AmountError> {
        if index > Self::MAX {
            return Err(AmountError::NftIndexTooLarge(index));
        }
        Ok(Self(index))
    }

    /// Returns a new [`NftIndex`] without checking its range.
    pub const fn new_unchecked(index: u64) -> Self {
        Self(index)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub const fn is_valid(&self) -> bool {
        self.0 <= Self::MAX
    }
}

impl fmt::Display for NftIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serializable for NftIndex {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u64(self.0);
    }
}

impl Deserializable for NftIndex {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let index = source.read_u64()?;
        NftIndex::new(index).map_err(|err| DeserializationError::InvalidValue(err.to_string()))
    }
}

// NFT INFO
// ================================================================================================

/// The state of a non-fungible token slot.
///
/// A slot whose `owner_account_index` is `None` is empty: the token was never minted, or it was
/// withdrawn to the base chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftInfo {
    pub nft_index: NftIndex,
    pub creator_account_index: AccountIndex,
    pub owner_account_index: Option<AccountIndex>,
    pub content_hash: Digest,
    pub collection_id: u32,
    pub creator_treasury_rate: u16,
}

impl NftInfo {
    /// Returns an empty slot for the given index.
    pub fn empty(nft_index: NftIndex) -> Self {
        Self {
            nft_index,
            creator_account_index: AccountIndex::new(0),
            owner_account_index: None,
            content_hash: Digest::default(),
            collection_id: 0,
            creator_treasury_rate: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.owner_account_index.is_none()
    }

    /// Returns true if the token is currently held by `account_index`.
    pub fn is_owned_by(&self, account_index: AccountIndex) -> bool {
        self.owner_account_index == Some(account_index)
    }

    /// Returns a copy of this token with a new owner.
    pub fn with_owner(&self, owner: AccountIndex) -> Self {
        Self { owner_account_index: Some(owner), ..self.clone() }
    }

    /// Writes the field element encoding of this token. An empty slot encodes as all zeros.
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        match self.owner_account_index {
            Some(owner) => {
                writer
                    .push_bool(true)
                    .push_u32(owner.as_u32())
                    .push_u32(self.creator_account_index.as_u32())
                    .push_u32(self.collection_id)
                    .push_u32(self.creator_treasury_rate as u32)
                    .push_digest(self.content_hash);
            },
            None => {
                writer.push_bool(false).push_u32(0).push_u32(0).push_u32(0).push_u32(0);
                writer.push_digest(Digest::default());
            },
        }
    }

    /// Returns the commitment to this token, or `None` for an empty slot.
    pub fn commitment(&self) -> Option<Digest> {
        if self.is_empty() {
            return None;
        }
        let mut writer = ElementWriter::new();
        writer.push_u64(self.nft_index.as_u64());
        self.write_elements(&mut writer);
        Some(Hasher::hash_elements(writer.as_elements()))
    }
}

impl Serializable for NftInfo {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.nft_index.write_into(target);
        self.creator_account_index.write_into(target);
        match self.owner_account_index {
            Some(owner) => {
                target.write_bool(true);
                owner.write_into(target);
            },
            None => target.write_bool(false),
        }
        self.content_hash.write_into(target);
        target.write_u32(self.collection_id);
        target.write_u16(self.creator_treasury_rate);
    }
}

impl Deserializable for NftInfo {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let nft_index = source.read()?;
        let creator_account_index = source.read()?;
        let owner_account_index = if source.read_bool()? { Some(source.read()?) } else { None };
        Ok(Self {
            nft_index,
            creator_account_index,
            owner_account_index,
            content_hash: source.read()?,
            collection_id: source.read_u32()?,
            creator_treasury_rate: source.read_u16()?,
        })
    }
}

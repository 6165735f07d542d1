use alloc::string::String;

use num_bigint::{BigInt, BigUint};

use crate::{
    Felt, STATE_VALUE_WIDTH,
    account::{
        AccountAsset, AccountIndex, AssetId, AssetType, LiquidityPool, NftIndex, NftInfo,
        PairIndex,
    },
    elements::ElementWriter,
    utils::{
        read_amount, read_signed_amount, read_string,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
        write_amount, write_signed_amount, write_string,
    },
};

// DETAIL KEY
// ================================================================================================

/// Identifies the piece of state a detail record changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetailKey {
    /// A fungible asset slot (balance and offer bitmap) of an account.
    Asset(AccountIndex, AssetId),
    /// An account's share of a liquidity pool.
    LpShare(AccountIndex, PairIndex),
    /// The reserves of a liquidity pool.
    Pool(PairIndex),
    Nft(NftIndex),
}

impl DetailKey {
    pub fn asset_type(&self) -> AssetType {
        match self {
            Self::Asset(..) => AssetType::General,
            Self::LpShare(..) => AssetType::LiquidityLp,
            Self::Pool(_) => AssetType::Liquidity,
            Self::Nft(_) => AssetType::Nft,
        }
    }

    /// Returns the account owning the state, if the state belongs to an account.
    pub fn account_index(&self) -> Option<AccountIndex> {
        match self {
            Self::Asset(account_index, _) | Self::LpShare(account_index, _) => Some(*account_index),
            Self::Pool(_) | Self::Nft(_) => None,
        }
    }

    /// Writes the key as three elements: asset type, primary key and secondary key.
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        let (key, sub_key) = match self {
            Self::Asset(account, asset) => (account.as_u32() as u64, asset.as_u32()),
            Self::LpShare(account, pair) => (account.as_u32() as u64, pair.as_u16() as u32),
            Self::Pool(pair) => (pair.as_u16() as u64, 0),
            Self::Nft(nft) => (nft.as_u64(), 0),
        };
        writer
            .push_u32(self.asset_type().as_u8() as u32)
            .push_felt(Felt::new(key))
            .push_u32(sub_key);
    }
}

// BALANCE DELTA
// ================================================================================================

/// The change a transaction applies to one piece of state.
///
/// Fungible changes are signed amounts added to the current value. Offer bitmaps are merged by
/// union, so a bit set once is never cleared. NFT changes carry the full post-state of the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceDelta {
    Asset {
        account_index: AccountIndex,
        asset_id: AssetId,
        balance: BigInt,
        offer_bitmap: Option<BigUint>,
    },
    LpShare {
        account_index: AccountIndex,
        pair_index: PairIndex,
        lp_amount: BigInt,
    },
    Pool {
        pair_index: PairIndex,
        asset_a: BigInt,
        asset_b: BigInt,
        lp_amount: BigInt,
    },
    Nft {
        nft_index: NftIndex,
        new_state: NftInfo,
    },
}

impl BalanceDelta {
    pub fn key(&self) -> DetailKey {
        match self {
            Self::Asset { account_index, asset_id, .. } => {
                DetailKey::Asset(*account_index, *asset_id)
            },
            Self::LpShare { account_index, pair_index, .. } => {
                DetailKey::LpShare(*account_index, *pair_index)
            },
            Self::Pool { pair_index, .. } => DetailKey::Pool(*pair_index),
            Self::Nft { nft_index, .. } => DetailKey::Nft(*nft_index),
        }
    }
}

// TRANSACTION DETAIL
// ================================================================================================

/// One ordered state change emitted by the verifier for a transaction.
///
/// Details of a transaction are ordered by `order`, starting at zero. Replaying the details of a
/// block in order reproduces its state transition exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxDetail {
    pub delta: BalanceDelta,
    /// Name of the owning account; empty for pool and NFT records.
    pub account_name: String,
    pub order: u32,
}

impl TxDetail {
    pub fn key(&self) -> DetailKey {
        self.delta.key()
    }

    pub fn asset_type(&self) -> AssetType {
        self.key().asset_type()
    }

    pub fn account_index(&self) -> Option<AccountIndex> {
        self.key().account_index()
    }
}

// STATE VALUE
// ================================================================================================

/// The value stored under a [`DetailKey`] before or after a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Asset(AccountAsset),
    LpShare(BigUint),
    Pool(LiquidityPool),
    Nft(NftInfo),
}

impl StateValue {
    /// Writes the value as exactly [`STATE_VALUE_WIDTH`] elements.
    pub fn write_elements(&self, writer: &mut ElementWriter) {
        let mut value = ElementWriter::new();
        match self {
            Self::Asset(asset) => asset.write_elements(&mut value),
            Self::LpShare(lp_amount) => {
                value.push_amount(lp_amount);
            },
            Self::Pool(pool) => pool.write_elements(&mut value),
            Self::Nft(nft) => nft.write_elements(&mut value),
        }
        value.pad_to(STATE_VALUE_WIDTH);
        writer.extend(&value);
    }
}

/// The values of one piece of state before and after a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub key: DetailKey,
    pub pre: StateValue,
    pub post: StateValue,
}

// SERIALIZATION
// ================================================================================================

impl Serializable for DetailKey {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(self.asset_type().as_u8());
        match self {
            Self::Asset(account, asset) => {
                account.write_into(target);
                asset.write_into(target);
            },
            Self::LpShare(account, pair) => {
                account.write_into(target);
                pair.write_into(target);
            },
            Self::Pool(pair) => pair.write_into(target),
            Self::Nft(nft) => nft.write_into(target),
        }
    }
}

impl Deserializable for DetailKey {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        match source.read_u8()? {
            0 => Ok(Self::Asset(source.read()?, source.read()?)),
            1 => Ok(Self::Pool(source.read()?)),
            2 => Ok(Self::LpShare(source.read()?, source.read()?)),
            3 => Ok(Self::Nft(source.read()?)),
            tag => Err(DeserializationError::InvalidValue(format!("unknown asset type {tag}"))),
        }
    }
}

impl Serializable for BalanceDelta {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.key().write_into(target);
        match self {
            Self::Asset { balance, offer_bitmap, .. } => {
                write_signed_amount(target, balance);
                match offer_bitmap {
                    Some(bitmap) => {
                        target.write_bool(true);
                        write_amount(target, bitmap);
                    },
                    None => target.write_bool(false),
                }
            },
            Self::LpShare { lp_amount, .. } => write_signed_amount(target, lp_amount),
            Self::Pool { asset_a, asset_b, lp_amount, .. } => {
                write_signed_amount(target, asset_a);
                write_signed_amount(target, asset_b);
                write_signed_amount(target, lp_amount);
            },
            Self::Nft { new_state, .. } => new_state.write_into(target),
        }
    }
}

impl Deserializable for BalanceDelta {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(match DetailKey::read_from(source)? {
            DetailKey::Asset(account_index, asset_id) => {
                let balance = read_signed_amount(source)?;
                let offer_bitmap =
                    if source.read_bool()? { Some(read_amount(source)?) } else { None };
                Self::Asset { account_index, asset_id, balance, offer_bitmap }
            },
            DetailKey::LpShare(account_index, pair_index) => Self::LpShare {
                account_index,
                pair_index,
                lp_amount: read_signed_amount(source)?,
            },
            DetailKey::Pool(pair_index) => Self::Pool {
                pair_index,
                asset_a: read_signed_amount(source)?,
                asset_b: read_signed_amount(source)?,
                lp_amount: read_signed_amount(source)?,
            },
            DetailKey::Nft(nft_index) => Self::Nft { nft_index, new_state: source.read()? },
        })
    }
}

impl Serializable for TxDetail {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.delta.write_into(target);
        write_string(target, &self.account_name);
        target.write_u32(self.order);
    }
}

impl Deserializable for TxDetail {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            delta: source.read()?,
            account_name: read_string(source)?,
            order: source.read_u32()?,
        })
    }
}

impl Serializable for StateValue {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        match self {
            Self::Asset(asset) => {
                target.write_u8(AssetType::General.as_u8());
                asset.write_into(target);
            },
            Self::Pool(pool) => {
                target.write_u8(AssetType::Liquidity.as_u8());
                pool.write_into(target);
            },
            Self::LpShare(lp_amount) => {
                target.write_u8(AssetType::LiquidityLp.as_u8());
                write_amount(target, lp_amount);
            },
            Self::Nft(nft) => {
                target.write_u8(AssetType::Nft.as_u8());
                nft.write_into(target);
            },
        }
    }
}

impl Deserializable for StateValue {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        match source.read_u8()? {
            0 => Ok(Self::Asset(source.read()?)),
            1 => Ok(Self::Pool(source.read()?)),
            2 => Ok(Self::LpShare(read_amount(source)?)),
            3 => Ok(Self::Nft(source.read()?)),
            tag => Err(DeserializationError::InvalidValue(format!("unknown asset type {tag}"))),
        }
    }
}

impl Serializable for StateTransition {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.key.write_into(target);
        self.pre.write_into(target);
        self.post.write_into(target);
    }
}

impl Deserializable for StateTransition {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            key: source.read()?,
            pre: source.read()?,
            post: source.read()?,
        })
    }
}

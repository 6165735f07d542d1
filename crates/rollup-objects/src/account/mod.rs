use alloc::{collections::BTreeMap, string::String};
use core::fmt;

use crate::{
    AccountError, Digest, Hasher, MAX_ACCOUNT_NAME_LENGTH,
    elements::ElementWriter,
    utils::{
        read_string,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
        write_string,
    },
};

mod asset;
pub use asset::{AccountAsset, AssetId, AssetType, validate_amount};

mod nft;
pub use nft::{NftIndex, NftInfo};

mod pool;
pub use pool::{LiquidityPool, PairIndex};

// ACCOUNT INDEX
// ================================================================================================

/// Dense identifier of a rollup account. Indices are assigned sequentially starting at zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountIndex(u32);

impl AccountIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the index following this one, or `None` on overflow.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl From<u32> for AccountIndex {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for AccountIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serializable for AccountIndex {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u32(self.0);
    }
}

impl Deserializable for AccountIndex {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        source.read_u32().map(Self)
    }
}

// ACCOUNT STATE
// ================================================================================================

/// The state of a rollup account.
///
/// An account consists of:
/// - An immutable index and name. The name is bound into transactions through
///   [`AccountState::account_name_hash`].
/// - A public key committing to the key used to authenticate the account's transactions.
/// - A nonce which must match the nonce of the next signed transaction and is incremented once the
///   transaction is applied.
/// - A collection nonce, which is the id of the next NFT collection the account may create.
/// - A sparse map of asset slots. Missing slots are equivalent to an empty [`AccountAsset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    account_index: AccountIndex,
    account_name: String,
    public_key: Digest,
    nonce: u64,
    collection_nonce: u64,
    assets: BTreeMap<AssetId, AccountAsset>,
}

impl AccountState {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Returns a new account without any assets and with both nonces set to zero.
    ///
    /// # Errors
    /// Returns an error if the account name is not valid. See [`validate_account_name`].
    pub fn new(
        account_index: AccountIndex,
        account_name: impl Into<String>,
        public_key: Digest,
    ) -> Result<Self, AccountError> {
        let account_name = account_name.into();
        validate_account_name(&account_name)?;

        Ok(Self {
            account_index,
            account_name,
            public_key,
            nonce: 0,
            collection_nonce: 0,
            assets: BTreeMap::new(),
        })
    }

    /// Returns this account with the provided nonce.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Returns this account with the provided asset slot.
    pub fn with_asset(mut self, asset_id: AssetId, asset: AccountAsset) -> Self {
        self.set_asset(asset_id, asset);
        self
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn account_index(&self) -> AccountIndex {
        self.account_index
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Returns the hash of the account name, which transactions use to refer to the account.
    pub fn account_name_hash(&self) -> Digest {
        account_name_hash(&self.account_name)
    }

    pub fn public_key(&self) -> Digest {
        self.public_key
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn collection_nonce(&self) -> u64 {
        self.collection_nonce
    }

    /// Returns the asset slot with the given id, if it was ever touched.
    pub fn asset(&self, asset_id: AssetId) -> Option<&AccountAsset> {
        self.assets.get(&asset_id)
    }

    pub fn assets(&self) -> impl Iterator<Item = (&AssetId, &AccountAsset)> {
        self.assets.iter()
    }

    /// Returns a commitment to the full account state.
    ///
    /// Empty asset slots do not contribute to the commitment, so a slot that was materialized but
    /// never funded does not change it.
    pub fn commitment(&self) -> Digest {
        let mut writer = ElementWriter::new();
        writer
            .push_u32(self.account_index.as_u32())
            .push_digest(self.account_name_hash())
            .push_digest(self.public_key)
            .push_u64(self.nonce)
            .push_u64(self.collection_nonce);
        for (asset_id, asset) in self.assets.iter().filter(|(_, asset)| !asset.is_empty()) {
            writer.push_u32(asset_id.as_u32());
            asset.write_elements(&mut writer);
        }
        Hasher::hash_elements(writer.as_elements())
    }

    // STATE MUTATORS
    // --------------------------------------------------------------------------------------------

    /// Replaces the asset slot with the given id.
    pub fn set_asset(&mut self, asset_id: AssetId, asset: AccountAsset) {
        self.assets.insert(asset_id, asset);
    }

    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    pub fn set_collection_nonce(&mut self, collection_nonce: u64) {
        self.collection_nonce = collection_nonce;
    }
}

impl Serializable for AccountState {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        write_string(target, &self.account_name);
        self.public_key.write_into(target);
        target.write_u64(self.nonce);
        target.write_u64(self.collection_nonce);
        target.write_usize(self.assets.len());
        for (asset_id, asset) in self.assets.iter() {
            asset_id.write_into(target);
            asset.write_into(target);
        }
    }
}

impl Deserializable for AccountState {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let account_index = source.read()?;
        let account_name = read_string(source)?;
        let public_key = source.read()?;
        let nonce = source.read_u64()?;
        let collection_nonce = source.read_u64()?;

        let mut account = Self::new(account_index, account_name, public_key)
            .map_err(|err| DeserializationError::InvalidValue(err.to_string()))?;
        account.nonce = nonce;
        account.collection_nonce = collection_nonce;

        let num_assets = source.read_usize()?;
        for _ in 0..num_assets {
            let asset_id: AssetId = source.read()?;
            let asset: AccountAsset = source.read()?;
            account.assets.insert(asset_id, asset);
        }

        Ok(account)
    }
}

// HELPERS
// ================================================================================================

/// Checks that an account name is non-empty, at most [`MAX_ACCOUNT_NAME_LENGTH`] bytes long and
/// consists only of lowercase ASCII letters, digits, `.` and `_`.
pub fn validate_account_name(name: &str) -> Result<(), AccountError> {
    if name.is_empty() {
        return Err(AccountError::EmptyAccountName);
    }
    if name.len() > MAX_ACCOUNT_NAME_LENGTH {
        return Err(AccountError::AccountNameTooLong(name.len()));
    }
    if let Some(invalid) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.' || *c == '_'))
    {
        return Err(AccountError::InvalidAccountNameCharacter(invalid));
    }
    Ok(())
}

/// Returns the hash binding an account name into transaction payloads.
pub fn account_name_hash(name: &str) -> Digest {
    Hasher::hash(name.as_bytes())
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use miden_crypto::utils::{Deserializable, Serializable};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("alice", true)]
    #[case("bob_1.rollup", true)]
    #[case("", false)]
    #[case("Alice", false)]
    #[case("alice bob", false)]
    #[case("a_name_that_is_way_too_long_to_be_valid", false)]
    fn account_name_validation(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_account_name(name).is_ok(), valid);
    }

    #[test]
    fn invalid_character_is_reported() {
        assert_matches!(
            validate_account_name("al-ice"),
            Err(AccountError::InvalidAccountNameCharacter('-'))
        );
    }

    #[test]
    fn empty_asset_slots_do_not_change_commitment() -> anyhow::Result<()> {
        let account = AccountState::new(AccountIndex::new(3), "carol", Digest::default())?;
        let with_empty_slot =
            account.clone().with_asset(AssetId::new(7), AccountAsset::default());
        assert_eq!(account.commitment(), with_empty_slot.commitment());

        let funded = account.clone().with_asset(AssetId::new(7), AccountAsset::with_balance(5u32));
        assert_ne!(account.commitment(), funded.commitment());
        Ok(())
    }

    #[test]
    fn account_serialization() -> anyhow::Result<()> {
        let account = AccountState::new(AccountIndex::new(1), "dave", Digest::default())?
            .with_nonce(9)
            .with_asset(AssetId::new(0), AccountAsset::with_balance(1000u32));

        let decoded = AccountState::read_from_bytes(&account.to_bytes()).unwrap();
        assert_eq!(decoded, account);
        Ok(())
    }
}

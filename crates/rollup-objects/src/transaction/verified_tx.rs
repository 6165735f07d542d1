use alloc::{string::String, vec::Vec};
use core::fmt;

use super::{StateTransition, TransactionInfo, TxDetail};
use crate::{
    Digest, Hasher,
    account::{AccountIndex, AccountState, LiquidityPool},
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// TRANSACTION ID
// ================================================================================================

/// A unique identifier of a transaction.
///
/// The id is the hash of the serialized transaction, signatures included, so two transactions
/// are identical if and only if they have the same id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(Digest);

impl TransactionId {
    pub fn inner(&self) -> Digest {
        self.0
    }

    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl From<&TransactionInfo> for TransactionId {
    fn from(tx: &TransactionInfo) -> Self {
        Self(Hasher::hash(&tx.to_bytes()))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// CREATED ENTITY
// ================================================================================================

/// State created by a transaction rather than changed through detail records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedEntity {
    Account(AccountState),
    Pool(LiquidityPool),
}

// VERIFIED TRANSACTION
// ================================================================================================

/// A transaction which passed verification against a state snapshot, together with the ordered
/// changes it applies.
///
/// A verified transaction has not been applied yet: applying it can still fail if the state
/// changed since it was verified, e.g. because the expected nonce was consumed in the meantime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedTransaction {
    tx: TransactionInfo,
    id: TransactionId,
    details: Vec<TxDetail>,
    expected_nonce: Option<(AccountIndex, u64)>,
    created: Option<CreatedEntity>,
    collection_nonce: Option<(AccountIndex, u64)>,
    pubdata: Vec<u8>,
}

impl VerifiedTransaction {
    /// Returns a new verified transaction applying `details` in order.
    ///
    /// # Panics
    /// Panics if the detail orders are not `0, 1, 2, ...`.
    pub fn new(tx: TransactionInfo, details: Vec<TxDetail>, pubdata: Vec<u8>) -> Self {
        assert!(
            details.iter().enumerate().all(|(i, detail)| detail.order as usize == i),
            "transaction details must be ordered consecutively from zero"
        );
        let expected_nonce = tx.account_index().zip(tx.nonce());
        Self {
            id: tx.id(),
            tx,
            details,
            expected_nonce,
            created: None,
            collection_nonce: None,
            pubdata,
        }
    }

    /// Returns this transaction with an entity it creates when applied.
    pub fn with_created(mut self, created: CreatedEntity) -> Self {
        self.created = Some(created);
        self
    }

    /// Returns this transaction with the collection nonce it sets for an account when applied.
    pub fn with_collection_nonce(mut self, account_index: AccountIndex, nonce: u64) -> Self {
        self.collection_nonce = Some((account_index, nonce));
        self
    }

    pub fn tx(&self) -> &TransactionInfo {
        &self.tx
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn details(&self) -> &[TxDetail] {
        &self.details
    }

    /// Returns the account whose nonce this transaction consumes, and the nonce it expects.
    pub fn expected_nonce(&self) -> Option<(AccountIndex, u64)> {
        self.expected_nonce
    }

    pub fn created(&self) -> Option<&CreatedEntity> {
        self.created.as_ref()
    }

    pub fn collection_nonce(&self) -> Option<(AccountIndex, u64)> {
        self.collection_nonce
    }

    pub fn pubdata(&self) -> &[u8] {
        &self.pubdata
    }
}

// EXECUTED TRANSACTION
// ================================================================================================

/// The nonce change of the account originating a signed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceTransition {
    pub account_index: AccountIndex,
    pub before: u64,
    pub after: u64,
}

/// A transaction applied to the account state, with the state values it touched before and after
/// it was applied.
///
/// Transitions are listed in the order of the transaction's details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedTransaction {
    verified: VerifiedTransaction,
    transitions: Vec<StateTransition>,
    nonce_transition: Option<NonceTransition>,
}

impl ExecutedTransaction {
    pub fn new(
        verified: VerifiedTransaction,
        transitions: Vec<StateTransition>,
        nonce_transition: Option<NonceTransition>,
    ) -> Self {
        Self { verified, transitions, nonce_transition }
    }

    pub fn verified(&self) -> &VerifiedTransaction {
        &self.verified
    }

    pub fn tx(&self) -> &TransactionInfo {
        self.verified.tx()
    }

    pub fn id(&self) -> TransactionId {
        self.verified.id()
    }

    pub fn details(&self) -> &[TxDetail] {
        self.verified.details()
    }

    pub fn pubdata(&self) -> &[u8] {
        self.verified.pubdata()
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn nonce_transition(&self) -> Option<NonceTransition> {
        self.nonce_transition
    }
}

// SERIALIZATION
// ================================================================================================

impl Serializable for TransactionId {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.0.write_into(target);
    }
}

impl Deserializable for TransactionId {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        source.read().map(Self)
    }
}

impl Serializable for CreatedEntity {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        match self {
            Self::Account(account) => {
                target.write_u8(0);
                account.write_into(target);
            },
            Self::Pool(pool) => {
                target.write_u8(1);
                pool.write_into(target);
            },
        }
    }
}

impl Deserializable for CreatedEntity {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        match source.read_u8()? {
            0 => Ok(Self::Account(source.read()?)),
            1 => Ok(Self::Pool(source.read()?)),
            tag => Err(DeserializationError::InvalidValue(format!("unknown entity tag {tag}"))),
        }
    }
}

impl Serializable for VerifiedTransaction {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.tx.write_into(target);
        self.details.write_into(target);
        self.created.write_into(target);
        target.write_bool(self.collection_nonce.is_some());
        if let Some((account_index, nonce)) = self.collection_nonce {
            account_index.write_into(target);
            target.write_u64(nonce);
        }
        self.pubdata.write_into(target);
    }
}

impl Deserializable for VerifiedTransaction {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let tx: TransactionInfo = source.read()?;
        let details: Vec<TxDetail> = source.read()?;
        let created: Option<CreatedEntity> = source.read()?;
        let collection_nonce = if source.read_bool()? {
            Some((source.read()?, source.read_u64()?))
        } else {
            None
        };
        let pubdata: Vec<u8> = source.read()?;

        if details.iter().enumerate().any(|(i, detail)| detail.order as usize != i) {
            return Err(DeserializationError::InvalidValue(
                "transaction details are not ordered consecutively".into(),
            ));
        }
        let mut verified = Self::new(tx, details, pubdata);
        verified.created = created;
        verified.collection_nonce = collection_nonce;
        Ok(verified)
    }
}

impl Serializable for NonceTransition {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.account_index.write_into(target);
        target.write_u64(self.before);
        target.write_u64(self.after);
    }
}

impl Deserializable for NonceTransition {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            account_index: source.read()?,
            before: source.read_u64()?,
            after: source.read_u64()?,
        })
    }
}

impl Serializable for ExecutedTransaction {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.verified.write_into(target);
        self.transitions.write_into(target);
        self.nonce_transition.write_into(target);
    }
}

impl Deserializable for ExecutedTransaction {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            verified: source.read()?,
            transitions: source.read()?,
            nonce_transition: source.read()?,
        })
    }
}

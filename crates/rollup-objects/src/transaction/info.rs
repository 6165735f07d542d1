use alloc::collections::BTreeSet;

use super::{
    AddLiquidityTx, AtomicMatchTx, CancelOfferTx, CreateCollectionTx, CreatePairTx, DepositNftTx,
    DepositTx, FullExitNftTx, FullExitTx, GasFee, MintNftTx, RegisterTx, RemoveLiquidityTx,
    SwapTx, TransactionId, TransferNftTx, TransferTx, TxType, WithdrawNftTx, WithdrawTx,
};
use crate::{
    account::{AccountIndex, NftIndex, PairIndex},
    elements::ElementWriter,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// TRANSACTION INFO
// ================================================================================================

/// A rollup transaction, one variant per transaction type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionInfo {
    Register(RegisterTx),
    CreatePair(CreatePairTx),
    Deposit(DepositTx),
    DepositNft(DepositNftTx),
    Transfer(TransferTx),
    Swap(SwapTx),
    AddLiquidity(AddLiquidityTx),
    RemoveLiquidity(RemoveLiquidityTx),
    Withdraw(WithdrawTx),
    CreateCollection(CreateCollectionTx),
    MintNft(MintNftTx),
    TransferNft(TransferNftTx),
    AtomicMatch(AtomicMatchTx),
    CancelOffer(CancelOfferTx),
    WithdrawNft(WithdrawNftTx),
    FullExit(FullExitTx),
    FullExitNft(FullExitNftTx),
}

impl TransactionInfo {
    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn tx_type(&self) -> TxType {
        match self {
            Self::Register(_) => TxType::Register,
            Self::CreatePair(_) => TxType::CreatePair,
            Self::Deposit(_) => TxType::Deposit,
            Self::DepositNft(_) => TxType::DepositNft,
            Self::Transfer(_) => TxType::Transfer,
            Self::Swap(_) => TxType::Swap,
            Self::AddLiquidity(_) => TxType::AddLiquidity,
            Self::RemoveLiquidity(_) => TxType::RemoveLiquidity,
            Self::Withdraw(_) => TxType::Withdraw,
            Self::CreateCollection(_) => TxType::CreateCollection,
            Self::MintNft(_) => TxType::MintNft,
            Self::TransferNft(_) => TxType::TransferNft,
            Self::AtomicMatch(_) => TxType::AtomicMatch,
            Self::CancelOffer(_) => TxType::CancelOffer,
            Self::WithdrawNft(_) => TxType::WithdrawNft,
            Self::FullExit(_) => TxType::FullExit,
            Self::FullExitNft(_) => TxType::FullExitNft,
        }
    }

    pub fn is_priority(&self) -> bool {
        self.tx_type().is_priority()
    }

    pub fn is_onchain(&self) -> bool {
        self.tx_type().is_onchain()
    }

    /// Returns the account the transaction originates from. Pool creation has no originating
    /// account.
    pub fn account_index(&self) -> Option<AccountIndex> {
        Some(match self {
            Self::Register(tx) => tx.account_index,
            Self::CreatePair(_) => return None,
            Self::Deposit(tx) => tx.account_index,
            Self::DepositNft(tx) => tx.account_index,
            Self::FullExit(tx) => tx.account_index,
            Self::FullExitNft(tx) => tx.account_index,
            Self::Transfer(tx) => tx.account_index,
            Self::Swap(tx) => tx.account_index,
            Self::AddLiquidity(tx) => tx.account_index,
            Self::RemoveLiquidity(tx) => tx.account_index,
            Self::Withdraw(tx) => tx.account_index,
            Self::CreateCollection(tx) => tx.account_index,
            Self::MintNft(tx) => tx.account_index,
            Self::TransferNft(tx) => tx.account_index,
            Self::AtomicMatch(tx) => tx.account_index,
            Self::CancelOffer(tx) => tx.account_index,
            Self::WithdrawNft(tx) => tx.account_index,
        })
    }

    /// Returns the nonce of a signed transaction, or `None` for priority operations.
    pub fn nonce(&self) -> Option<u64> {
        self.signed_parts().map(|(_, nonce, _)| nonce)
    }

    /// Returns the gas fee of a signed transaction, or `None` for priority operations.
    pub fn gas(&self) -> Option<&GasFee> {
        self.signed_parts().map(|(gas, ..)| gas)
    }

    /// Returns the signature of a signed transaction, or `None` for priority operations.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signed_parts().map(|(.., signature)| signature)
    }

    /// Returns the transaction's signing fields: the type tag followed by every semantic field
    /// (signatures excluded) encoded as 32-bit limbs.
    pub fn signing_fields(&self) -> ElementWriter {
        let mut writer = ElementWriter::with_tag(self.tx_type().as_u8());
        match self {
            Self::Register(tx) => tx.write_elements(&mut writer),
            Self::CreatePair(tx) => tx.write_elements(&mut writer),
            Self::Deposit(tx) => tx.write_elements(&mut writer),
            Self::DepositNft(tx) => tx.write_elements(&mut writer),
            Self::FullExit(tx) => tx.write_elements(&mut writer),
            Self::FullExitNft(tx) => tx.write_elements(&mut writer),
            Self::Transfer(tx) => tx.write_elements(&mut writer),
            Self::Swap(tx) => tx.write_elements(&mut writer),
            Self::AddLiquidity(tx) => tx.write_elements(&mut writer),
            Self::RemoveLiquidity(tx) => tx.write_elements(&mut writer),
            Self::Withdraw(tx) => tx.write_elements(&mut writer),
            Self::CreateCollection(tx) => tx.write_elements(&mut writer),
            Self::MintNft(tx) => tx.write_elements(&mut writer),
            Self::TransferNft(tx) => tx.write_elements(&mut writer),
            Self::AtomicMatch(tx) => tx.write_elements(&mut writer),
            Self::CancelOffer(tx) => tx.write_elements(&mut writer),
            Self::WithdrawNft(tx) => tx.write_elements(&mut writer),
        }
        writer
    }

    /// Returns the unique identifier of this transaction.
    pub fn id(&self) -> TransactionId {
        TransactionId::from(self)
    }

    /// Returns the state entities this transaction reads or credits.
    ///
    /// The footprint of atomic matches and registrations is incomplete: a match also credits the
    /// NFT creator, which is only known from state, and a registration depends on the next free
    /// account index.
    pub fn footprint(&self) -> Footprint {
        use StateKey::{Account, Nft, Pool};

        let mut footprint = Footprint::default();
        if let Some(gas) = self.gas() {
            footprint.credits.insert(Account(gas.gas_account_index));
        }
        match self {
            Self::Register(tx) => {
                footprint.reads.insert(Account(tx.account_index));
                footprint.complete = false;
            },
            Self::CreatePair(tx) => {
                footprint.reads.insert(Pool(tx.pair_index));
            },
            Self::Deposit(tx) => {
                footprint.credits.insert(Account(tx.account_index));
            },
            Self::DepositNft(tx) => {
                footprint.credits.insert(Account(tx.account_index));
                footprint.reads.insert(Nft(tx.nft_index));
            },
            Self::FullExit(tx) => {
                footprint.reads.insert(Account(tx.account_index));
            },
            Self::FullExitNft(tx) => {
                footprint.reads.extend([Account(tx.account_index), Nft(tx.nft_index)]);
            },
            Self::Transfer(tx) => {
                footprint.reads.insert(Account(tx.account_index));
                footprint.credits.insert(Account(tx.to_account_index));
            },
            Self::Swap(SwapTx { account_index, pair_index, .. })
            | Self::AddLiquidity(AddLiquidityTx { account_index, pair_index, .. })
            | Self::RemoveLiquidity(RemoveLiquidityTx { account_index, pair_index, .. }) => {
                footprint.reads.extend([Account(*account_index), Pool(*pair_index)]);
            },
            Self::Withdraw(WithdrawTx { account_index, .. })
            | Self::CreateCollection(CreateCollectionTx { account_index, .. })
            | Self::CancelOffer(CancelOfferTx { account_index, .. }) => {
                footprint.reads.insert(Account(*account_index));
            },
            Self::MintNft(tx) => {
                footprint.reads.extend([Account(tx.account_index), Nft(tx.nft_index)]);
                footprint.credits.insert(Account(tx.to_account_index));
            },
            Self::TransferNft(tx) => {
                footprint.reads.extend([Account(tx.account_index), Nft(tx.nft_index)]);
                footprint.credits.insert(Account(tx.to_account_index));
            },
            Self::WithdrawNft(tx) => {
                footprint.reads.extend([Account(tx.account_index), Nft(tx.nft_index)]);
            },
            Self::AtomicMatch(tx) => {
                footprint.reads.extend([
                    Account(tx.account_index),
                    Account(tx.buy_offer.account_index),
                    Account(tx.sell_offer.account_index),
                    Nft(tx.sell_offer.nft_index),
                ]);
                footprint.complete = false;
            },
        }
        footprint
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn signed_parts(&self) -> Option<(&GasFee, u64, &[u8])> {
        macro_rules! parts {
            ($tx:expr) => {
                Some((&$tx.gas, $tx.nonce, $tx.signature.as_slice()))
            };
        }

        match self {
            Self::Register(_)
            | Self::CreatePair(_)
            | Self::Deposit(_)
            | Self::DepositNft(_)
            | Self::FullExit(_)
            | Self::FullExitNft(_) => None,
            Self::Transfer(tx) => parts!(tx),
            Self::Swap(tx) => parts!(tx),
            Self::AddLiquidity(tx) => parts!(tx),
            Self::RemoveLiquidity(tx) => parts!(tx),
            Self::Withdraw(tx) => parts!(tx),
            Self::CreateCollection(tx) => parts!(tx),
            Self::MintNft(tx) => parts!(tx),
            Self::TransferNft(tx) => parts!(tx),
            Self::AtomicMatch(tx) => parts!(tx),
            Self::CancelOffer(tx) => parts!(tx),
            Self::WithdrawNft(tx) => parts!(tx),
        }
    }
}

impl Serializable for TransactionInfo {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.tx_type().write_into(target);
        match self {
            Self::Register(tx) => tx.write_into(target),
            Self::CreatePair(tx) => tx.write_into(target),
            Self::Deposit(tx) => tx.write_into(target),
            Self::DepositNft(tx) => tx.write_into(target),
            Self::FullExit(tx) => tx.write_into(target),
            Self::FullExitNft(tx) => tx.write_into(target),
            Self::Transfer(tx) => tx.write_into(target),
            Self::Swap(tx) => tx.write_into(target),
            Self::AddLiquidity(tx) => tx.write_into(target),
            Self::RemoveLiquidity(tx) => tx.write_into(target),
            Self::Withdraw(tx) => tx.write_into(target),
            Self::CreateCollection(tx) => tx.write_into(target),
            Self::MintNft(tx) => tx.write_into(target),
            Self::TransferNft(tx) => tx.write_into(target),
            Self::AtomicMatch(tx) => tx.write_into(target),
            Self::CancelOffer(tx) => tx.write_into(target),
            Self::WithdrawNft(tx) => tx.write_into(target),
        }
    }
}

impl Deserializable for TransactionInfo {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(match TxType::read_from(source)? {
            TxType::Empty => {
                return Err(DeserializationError::InvalidValue(
                    "empty transactions cannot be deserialized".into(),
                ));
            },
            TxType::Register => Self::Register(source.read()?),
            TxType::CreatePair => Self::CreatePair(source.read()?),
            TxType::Deposit => Self::Deposit(source.read()?),
            TxType::DepositNft => Self::DepositNft(source.read()?),
            TxType::FullExit => Self::FullExit(source.read()?),
            TxType::FullExitNft => Self::FullExitNft(source.read()?),
            TxType::Transfer => Self::Transfer(source.read()?),
            TxType::Swap => Self::Swap(source.read()?),
            TxType::AddLiquidity => Self::AddLiquidity(source.read()?),
            TxType::RemoveLiquidity => Self::RemoveLiquidity(source.read()?),
            TxType::Withdraw => Self::Withdraw(source.read()?),
            TxType::CreateCollection => Self::CreateCollection(source.read()?),
            TxType::MintNft => Self::MintNft(source.read()?),
            TxType::TransferNft => Self::TransferNft(source.read()?),
            TxType::AtomicMatch => Self::AtomicMatch(source.read()?),
            TxType::CancelOffer => Self::CancelOffer(source.read()?),
            TxType::WithdrawNft => Self::WithdrawNft(source.read()?),
        })
    }
}

// FOOTPRINT
// ================================================================================================

/// A state entity a transaction may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateKey {
    Account(AccountIndex),
    Pool(PairIndex),
    Nft(NftIndex),
}

/// The state entities touched by a transaction.
///
/// - `reads` are entities whose current state influences verification.
/// - `credits` are entities which only receive amounts; their current state does not influence
///   verification.
///
/// Two transactions with complete, non-conflicting footprints can be verified against the same
/// state in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footprint {
    pub reads: BTreeSet<StateKey>,
    pub credits: BTreeSet<StateKey>,
    pub complete: bool,
}

impl Default for Footprint {
    fn default() -> Self {
        Self {
            reads: BTreeSet::new(),
            credits: BTreeSet::new(),
            complete: true,
        }
    }
}

impl Footprint {
    /// Returns true if either footprint reads an entity the other one touches.
    pub fn conflicts_with(&self, other: &Footprint) -> bool {
        let touches = |footprint: &Footprint, key: &StateKey| {
            footprint.reads.contains(key) || footprint.credits.contains(key)
        };
        self.reads.iter().any(|key| touches(other, key))
            || other.reads.iter().any(|key| touches(self, key))
    }
}

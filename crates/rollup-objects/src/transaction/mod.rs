mod detail;
mod info;
mod nft;
mod priority;
mod pubdata;
mod signed;
mod tx_type;
mod verified_tx;

pub use detail::{BalanceDelta, DetailKey, StateTransition, StateValue, TxDetail};
pub use info::{Footprint, StateKey, TransactionInfo};
pub use nft::{
    AtomicMatchTx, CancelOfferTx, CreateCollectionTx, MintNftTx, Offer, OfferType, TransferNftTx,
    WithdrawNftTx,
};
pub use priority::{CreatePairTx, DepositNftTx, DepositTx, FullExitNftTx, FullExitTx, RegisterTx};
pub use pubdata::PubdataBuilder;
pub use signed::{
    AddLiquidityTx, GasFee, L1Address, RemoveLiquidityTx, SwapTx, TransferTx, WithdrawTx,
};
pub use tx_type::TxType;
pub use verified_tx::{
    CreatedEntity, ExecutedTransaction, NonceTransition, TransactionId, VerifiedTransaction,
};

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use miden_crypto::utils::{Deserializable, Serializable};

    use super::*;
    use crate::{
        Digest, MAX_TX_FIELDS,
        account::{AccountIndex, AssetId, NftIndex},
    };

    fn transfer(nonce: u64) -> TransactionInfo {
        TransactionInfo::Transfer(TransferTx {
            account_index: AccountIndex::new(1),
            to_account_index: AccountIndex::new(2),
            to_account_name_hash: Digest::default(),
            asset_id: AssetId::new(0),
            amount: 100u32.into(),
            gas: GasFee::new(AccountIndex::new(0), AssetId::new(0), 1u32),
            nonce,
            signature: vec![1, 2, 3],
        })
    }

    fn offer(offer_type: OfferType, account: u32) -> Offer {
        Offer {
            offer_type,
            offer_id: 200,
            account_index: AccountIndex::new(account),
            nft_index: NftIndex::new_unchecked(9),
            asset_id: AssetId::new(0),
            asset_amount: 5000u32.into(),
            treasury_rate: 100,
            signature: vec![],
        }
    }

    #[test]
    fn transaction_serialization() {
        let tx = transfer(5);
        let decoded = TransactionInfo::read_from_bytes(&tx.to_bytes()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.id(), tx.id());
        assert_ne!(transfer(6).id(), tx.id());
    }

    #[test]
    fn signing_fields_exclude_signature_and_start_with_tag() {
        let tx = transfer(5);
        let TransactionInfo::Transfer(mut other) = tx.clone() else { unreachable!() };
        other.signature = vec![9, 9];

        let fields = tx.signing_fields();
        assert_eq!(fields, TransactionInfo::Transfer(other).signing_fields());
        assert_eq!(fields.as_elements()[0], crate::Felt::from(TxType::Transfer.as_u8() as u32));
    }

    #[test]
    fn atomic_match_signing_fields_fit_the_witness() {
        let tx = TransactionInfo::AtomicMatch(AtomicMatchTx {
            account_index: AccountIndex::new(3),
            buy_offer: offer(OfferType::Buy, 1),
            sell_offer: offer(OfferType::Sell, 2),
            gas: GasFee::new(AccountIndex::new(0), AssetId::new(0), 1u32),
            nonce: 0,
            signature: vec![],
        });
        assert!(tx.signing_fields().len() <= MAX_TX_FIELDS);
    }

    #[test]
    fn priority_operations_are_unsigned() {
        let tx = TransactionInfo::FullExit(FullExitTx {
            account_index: AccountIndex::new(1),
            account_name_hash: Digest::default(),
            asset_id: AssetId::new(0),
        });
        assert!(tx.is_priority());
        assert_eq!(tx.nonce(), None);
        assert_eq!(tx.signature(), None);
        assert_matches!(tx.account_index(), Some(index) if index == AccountIndex::new(1));
    }

    #[test]
    fn footprints_detect_conflicts() {
        let a = transfer(5).footprint();

        // another sender paying the same gas account does not conflict
        let mut other = transfer(0);
        if let TransactionInfo::Transfer(tx) = &mut other {
            tx.account_index = AccountIndex::new(7);
            tx.to_account_index = AccountIndex::new(8);
        }
        assert!(!a.conflicts_with(&other.footprint()));

        // spending from the recipient of the first transfer does
        if let TransactionInfo::Transfer(tx) = &mut other {
            tx.account_index = AccountIndex::new(2);
        }
        assert!(a.conflicts_with(&other.footprint()));
    }
}

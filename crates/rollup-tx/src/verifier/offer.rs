use num_bigint::BigUint;
use rollup_objects::{
    Digest, ElementWriter, RATE_BASE,
    account::AssetId,
    transaction::{
        AtomicMatchTx, CancelOfferTx, Offer, OfferType, PubdataBuilder, TransactionInfo,
        VerifiedTransaction,
    },
};

use super::{
    OfferRecancelPolicy, TransactionVerifier, charge_gas, check_amount, credit, credit_gas, debit,
    finalize, gas_pubdata,
};
use crate::{DeltaAccumulator, SignatureScheme, StateSnapshot, VerifierError};

// OFFER OPERATIONS
// ================================================================================================

impl<S: SignatureScheme> TransactionVerifier<S> {
    /// Cancels an offer by setting its bit in the offer bitmap of the maker.
    ///
    /// The asset slot holding the bit is created if the account never touched it. Whether an
    /// offer which is already canceled or finalized can be canceled again is governed by
    /// [`OfferRecancelPolicy`].
    pub(super) fn verify_cancel_offer(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        cancel: &CancelOfferTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let (asset_id, bit) = offer_position(cancel.offer_id)?;
        let slot = snapshot.asset_or_default(cancel.account_index, asset_id)?;
        if slot.is_offer_finalized(bit)
            && self.config.offer_recancel_policy == OfferRecancelPolicy::Reject
        {
            return Err(VerifierError::OfferAlreadyFinalized {
                account_index: cancel.account_index,
                offer_id: cancel.offer_id,
            });
        }
        self.authenticate(snapshot, tx, cancel.account_index, &cancel.gas, cancel.nonce)?;

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, cancel.account_index, &cancel.gas);
        accumulator.set_offer_bit(cancel.account_index, asset_id, bit);
        credit_gas(&mut accumulator, &cancel.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(cancel.account_index)
            .offer_id(cancel.offer_id);
        let pubdata = gas_pubdata(pubdata, &cancel.gas).build();

        finalize(snapshot, tx, accumulator, pubdata)
    }

    /// Settles a buy offer against a sell offer for the same NFT.
    ///
    /// The buyer pays the offer amount. Out of that amount the gas account receives the treasury
    /// fee of the sell offer, the NFT creator receives its royalty and the seller receives the
    /// rest. The NFT moves to the buyer and both offers are marked as finalized.
    pub(super) fn verify_atomic_match(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        matched: &AtomicMatchTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let buy = &matched.buy_offer;
        let sell = &matched.sell_offer;
        if buy.offer_type != OfferType::Buy || sell.offer_type != OfferType::Sell {
            return Err(VerifierError::InvalidPayload("offers must be a buy and a sell offer"));
        }
        if buy.nft_index != sell.nft_index
            || buy.asset_id != sell.asset_id
            || buy.asset_amount != sell.asset_amount
        {
            return Err(VerifierError::InvalidPayload("offers do not match"));
        }
        if buy.account_index == sell.account_index {
            return Err(VerifierError::InvalidPayload("offers are made by the same account"));
        }
        check_amount(&sell.asset_amount)?;

        let buyer = snapshot.account(buy.account_index)?;
        snapshot.asset(buy.account_index, buy.asset_id)?;
        let seller = snapshot.account(sell.account_index)?;
        let nft = snapshot.existing_nft(sell.nft_index)?;
        if !nft.is_owned_by(sell.account_index) {
            return Err(VerifierError::NftNotOwned {
                nft_index: sell.nft_index,
                account_index: sell.account_index,
            });
        }
        snapshot.account(nft.creator_account_index)?;
        if sell.treasury_rate as u32 + nft.creator_treasury_rate as u32 > RATE_BASE {
            return Err(VerifierError::InvalidPayload("treasury and royalty exceed the price"));
        }
        let buy_position = self.check_offer_open(snapshot, buy)?;
        let sell_position = self.check_offer_open(snapshot, sell)?;

        self.authenticate(snapshot, tx, matched.account_index, &matched.gas, matched.nonce)?;
        self.check_signature(buyer, &buy.signature, self.offer_message(buy))?;
        self.check_signature(seller, &sell.signature, self.offer_message(sell))?;

        let amount = &sell.asset_amount;
        let treasury = fee(amount, sell.treasury_rate);
        let royalty = fee(amount, nft.creator_treasury_rate);
        let proceeds = amount - &treasury - &royalty;

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, matched.account_index, &matched.gas);
        accumulator.add(buy.account_index, buy.asset_id, debit(amount));
        accumulator.add(sell.account_index, sell.asset_id, credit(&proceeds));
        accumulator.add(nft.creator_account_index, sell.asset_id, credit(&royalty));
        accumulator.add(matched.gas.gas_account_index, sell.asset_id, credit(&treasury));
        accumulator.set_offer_bit(buy.account_index, buy_position.0, buy_position.1);
        accumulator.set_offer_bit(sell.account_index, sell_position.0, sell_position.1);
        accumulator.set_nft(sell.nft_index, nft.with_owner(buy.account_index));
        credit_gas(&mut accumulator, &matched.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(matched.account_index)
            .account_index(buy.account_index)
            .offer_id(buy.offer_id)
            .account_index(sell.account_index)
            .offer_id(sell.offer_id)
            .nft_index(sell.nft_index)
            .asset_id(sell.asset_id)
            .amount(amount)
            .amount(&royalty)
            .amount(&treasury);
        let pubdata = gas_pubdata(pubdata, &matched.gas).build();

        finalize(snapshot, tx, accumulator, pubdata)
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    /// Returns the offer bitmap position of an offer which has been neither canceled nor
    /// finalized.
    fn check_offer_open(
        &self,
        snapshot: &StateSnapshot,
        offer: &Offer,
    ) -> Result<(AssetId, u64), VerifierError> {
        let (asset_id, bit) = offer_position(offer.offer_id)?;
        if snapshot.asset_or_default(offer.account_index, asset_id)?.is_offer_finalized(bit) {
            return Err(VerifierError::OfferAlreadyFinalized {
                account_index: offer.account_index,
                offer_id: offer.offer_id,
            });
        }
        Ok((asset_id, bit))
    }

    /// Returns the message the maker of an offer signs.
    fn offer_message(&self, offer: &Offer) -> Digest {
        let mut writer = ElementWriter::new();
        offer.write_elements(&mut writer);
        self.scheme.hash(writer.as_elements())
    }
}

fn offer_position(offer_id: u64) -> Result<(AssetId, u64), VerifierError> {
    AssetId::for_offer(offer_id).ok_or(VerifierError::InvalidPayload("offer id out of range"))
}

/// Returns the part of `amount` charged at `rate`, rounded down.
fn fee(amount: &BigUint, rate: u16) -> BigUint {
    amount * rate as u32 / RATE_BASE
}

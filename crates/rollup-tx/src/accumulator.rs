use alloc::{collections::BTreeMap, string::ToString, vec::Vec};

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
use rollup_objects::{
    account::{AccountIndex, AssetId, NftIndex, NftInfo, PairIndex, validate_amount},
    transaction::{BalanceDelta, DetailKey, TxDetail},
};

use crate::{StateSnapshot, VerifierError};

// DELTA ACCUMULATOR
// ================================================================================================

/// Collects the net changes of a single transaction before they are handed to the registry.
///
/// Changes to the same piece of state are merged into one record. Records keep the position at
/// which their key was first touched, which fixes the order of the resulting detail records.
///
/// Debits of an account's asset are also summed on their own, so that a credit to the same asset
/// within the transaction cannot pay for them.
#[derive(Debug, Default, Clone)]
pub struct DeltaAccumulator {
    deltas: Vec<BalanceDelta>,
    positions: BTreeMap<DetailKey, usize>,
    debits: BTreeMap<DetailKey, BigUint>,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a signed amount to the balance of an account's asset.
    pub fn add(&mut self, account_index: AccountIndex, asset_id: AssetId, delta: BigInt) {
        let key = DetailKey::Asset(account_index, asset_id);
        if delta.sign() == Sign::Minus {
            *self.debits.entry(key).or_default() += delta.magnitude();
        }
        let entry = self.entry(key, || BalanceDelta::Asset {
            account_index,
            asset_id,
            balance: BigInt::zero(),
            offer_bitmap: None,
        });
        if let BalanceDelta::Asset { balance, .. } = entry {
            *balance += delta;
        }
    }

    /// Marks an offer bit in the offer bitmap of an account's asset slot.
    pub fn set_offer_bit(&mut self, account_index: AccountIndex, asset_id: AssetId, bit: u64) {
        let entry = self.entry(DetailKey::Asset(account_index, asset_id), || BalanceDelta::Asset {
            account_index,
            asset_id,
            balance: BigInt::zero(),
            offer_bitmap: None,
        });
        if let BalanceDelta::Asset { offer_bitmap, .. } = entry {
            offer_bitmap.get_or_insert_with(BigUint::zero).set_bit(bit, true);
        }
    }

    /// Adds a signed amount to an account's share of a liquidity pool.
    pub fn add_lp(&mut self, account_index: AccountIndex, pair_index: PairIndex, delta: BigInt) {
        let entry = self.entry(DetailKey::LpShare(account_index, pair_index), || {
            BalanceDelta::LpShare {
                account_index,
                pair_index,
                lp_amount: BigInt::zero(),
            }
        });
        if let BalanceDelta::LpShare { lp_amount, .. } = entry {
            *lp_amount += delta;
        }
    }

    /// Adds signed amounts to the reserves and the share supply of a liquidity pool.
    pub fn add_pool(
        &mut self,
        pair_index: PairIndex,
        asset_a_delta: BigInt,
        asset_b_delta: BigInt,
        lp_delta: BigInt,
    ) {
        let entry = self.entry(DetailKey::Pool(pair_index), || BalanceDelta::Pool {
            pair_index,
            asset_a: BigInt::zero(),
            asset_b: BigInt::zero(),
            lp_amount: BigInt::zero(),
        });
        if let BalanceDelta::Pool { asset_a, asset_b, lp_amount, .. } = entry {
            *asset_a += asset_a_delta;
            *asset_b += asset_b_delta;
            *lp_amount += lp_delta;
        }
    }

    /// Sets the state of an NFT slot. A later call for the same token replaces the earlier one.
    pub fn set_nft(&mut self, nft_index: NftIndex, new_state: NftInfo) {
        let entry = self.entry(DetailKey::Nft(nft_index), || BalanceDelta::Nft {
            nft_index,
            new_state: NftInfo::empty(nft_index),
        });
        *entry = BalanceDelta::Nft { nft_index, new_state };
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    // VALIDATION
    // --------------------------------------------------------------------------------------------

    /// Checks that every accumulated change keeps the state it applies to within range.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the debits of an account's asset exceed its current balance, regardless of credits to the
    ///   same asset.
    /// - an account balance or pool share would become negative.
    /// - the reserves of a pool would become negative.
    /// - a resulting amount would not fit into a state amount.
    /// - a touched account or pool is not part of the snapshot.
    pub fn check_against(&self, snapshot: &StateSnapshot) -> Result<(), VerifierError> {
        for delta in &self.deltas {
            match delta {
                BalanceDelta::Asset { account_index, asset_id, balance, .. } => {
                    let current = snapshot.asset_or_default(*account_index, *asset_id)?.balance;
                    let debited = self.debits.get(&DetailKey::Asset(*account_index, *asset_id));
                    if let Some(debited) = debited.filter(|debited| **debited > current) {
                        return Err(VerifierError::InsufficientBalance {
                            account_index: *account_index,
                            asset_id: *asset_id,
                            balance: current,
                            required: debited.clone(),
                        });
                    }
                    match apply_signed(&current, balance) {
                        Ok(new_balance) => check_range(&new_balance)?,
                        Err(required) => {
                            return Err(VerifierError::InsufficientBalance {
                                account_index: *account_index,
                                asset_id: *asset_id,
                                balance: current,
                                required,
                            });
                        },
                    }
                },
                BalanceDelta::LpShare { account_index, pair_index, lp_amount } => {
                    let current = snapshot
                        .asset_or_default(*account_index, pair_index.lp_asset_id())?
                        .lp_amount;
                    match apply_signed(&current, lp_amount) {
                        Ok(new_amount) => check_range(&new_amount)?,
                        Err(required) => {
                            return Err(VerifierError::InsufficientLpAmount {
                                account_index: *account_index,
                                pair_index: *pair_index,
                                lp_amount: current,
                                required,
                            });
                        },
                    }
                },
                BalanceDelta::Pool { pair_index, asset_a, asset_b, lp_amount } => {
                    let pool = snapshot.pool(*pair_index)?;
                    let changes = [
                        (&pool.asset_a, asset_a),
                        (&pool.asset_b, asset_b),
                        (&pool.lp_amount, lp_amount),
                    ];
                    for (current, delta) in changes {
                        let new_amount = apply_signed(current, delta)
                            .map_err(|_| VerifierError::InsufficientLiquidity(*pair_index))?;
                        check_range(&new_amount)?;
                    }
                },
                BalanceDelta::Nft { .. } => (),
            }
        }
        Ok(())
    }

    /// Converts the accumulated changes into detail records ordered by first touch.
    ///
    /// Account names are taken from the snapshot. Pool and NFT records carry no account name.
    pub fn into_details(self, snapshot: &StateSnapshot) -> Vec<TxDetail> {
        self.deltas
            .into_iter()
            .enumerate()
            .map(|(order, delta)| {
                let account_name = delta
                    .key()
                    .account_index()
                    .and_then(|index| snapshot.account(index).ok())
                    .map(|account| account.account_name().to_string())
                    .unwrap_or_default();
                TxDetail { delta, account_name, order: order as u32 }
            })
            .collect()
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn entry(
        &mut self,
        key: DetailKey,
        default: impl FnOnce() -> BalanceDelta,
    ) -> &mut BalanceDelta {
        let position = *self.positions.entry(key).or_insert_with(|| {
            self.deltas.push(default());
            self.deltas.len() - 1
        });
        &mut self.deltas[position]
    }
}

/// Applies a signed delta to a non-negative amount, returning the missing amount if the result
/// would be negative.
pub(crate) fn apply_signed(current: &BigUint, delta: &BigInt) -> Result<BigUint, BigUint> {
    match delta.sign() {
        Sign::Minus => {
            let required = delta.magnitude();
            if required > current {
                Err(required.clone())
            } else {
                Ok(current - required)
            }
        },
        Sign::NoSign | Sign::Plus => Ok(current + delta.magnitude()),
    }
}

fn check_range(amount: &BigUint) -> Result<(), VerifierError> {
    validate_amount(amount).map_err(VerifierError::AmountOutOfRange)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rollup_objects::account::{AccountAsset, AccountState};

    use super::*;

    fn snapshot() -> StateSnapshot {
        let account = AccountState::new(AccountIndex::new(1), "alice", Default::default())
            .unwrap()
            .with_asset(AssetId::new(0), AccountAsset::with_balance(100u32));
        StateSnapshot::new(AccountIndex::new(2)).with_account(account)
    }

    #[test]
    fn deltas_for_the_same_key_are_merged_in_first_touch_order() {
        let alice = AccountIndex::new(1);
        let mut accumulator = DeltaAccumulator::new();
        accumulator.add(alice, AssetId::new(0), BigInt::from(-10));
        accumulator.set_offer_bit(alice, AssetId::new(3), 5);
        accumulator.add(alice, AssetId::new(0), BigInt::from(4));

        let details = accumulator.into_details(&snapshot());
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].order, 0);
        assert_eq!(details[0].account_name, "alice");
        assert_matches!(
            &details[0].delta,
            BalanceDelta::Asset { balance, offer_bitmap: None, .. } if *balance == BigInt::from(-6)
        );
        assert_matches!(
            &details[1].delta,
            BalanceDelta::Asset { offer_bitmap: Some(bitmap), .. } if bitmap.bit(5)
        );
    }

    #[test]
    fn overdrafts_are_rejected() {
        let alice = AccountIndex::new(1);
        let mut accumulator = DeltaAccumulator::new();
        accumulator.add(alice, AssetId::new(0), BigInt::from(-100));
        assert!(accumulator.check_against(&snapshot()).is_ok());

        accumulator.add(alice, AssetId::new(0), BigInt::from(-1));
        assert_matches!(
            accumulator.check_against(&snapshot()),
            Err(VerifierError::InsufficientBalance { required, .. })
                if required == BigUint::from(101u32)
        );
    }

    #[test]
    fn credits_do_not_cover_debits_of_the_same_asset() {
        let alice = AccountIndex::new(1);
        let mut accumulator = DeltaAccumulator::new();
        accumulator.add(alice, AssetId::new(0), BigInt::from(-100));
        accumulator.add(alice, AssetId::new(0), BigInt::from(60));
        assert!(accumulator.check_against(&snapshot()).is_ok());

        accumulator.add(alice, AssetId::new(0), BigInt::from(-1));
        assert_matches!(
            accumulator.check_against(&snapshot()),
            Err(VerifierError::InsufficientBalance { required, .. })
                if required == BigUint::from(101u32)
        );
    }

    #[test]
    fn unknown_accounts_are_reported() {
        let mut accumulator = DeltaAccumulator::new();
        accumulator.add(AccountIndex::new(9), AssetId::new(0), BigInt::from(1));
        assert_matches!(
            accumulator.check_against(&snapshot()),
            Err(VerifierError::MissingAccount(index)) if index == AccountIndex::new(9)
        );
    }

    #[test]
    fn results_must_fit_into_a_state_amount() {
        let mut accumulator = DeltaAccumulator::new();
        accumulator.add(AccountIndex::new(1), AssetId::new(0), BigInt::from(1u8) << 128);
        assert_matches!(
            accumulator.check_against(&snapshot()),
            Err(VerifierError::AmountOutOfRange(_))
        );
    }
}

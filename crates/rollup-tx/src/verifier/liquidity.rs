use num_bigint::BigUint;
use num_traits::Zero;
use rollup_objects::{
    RATE_BASE,
    account::LiquidityPool,
    transaction::{
        AddLiquidityTx, PubdataBuilder, RemoveLiquidityTx, SwapTx, TransactionInfo,
        VerifiedTransaction,
    },
};

use super::{
    TransactionVerifier, charge_gas, check_amount, credit, credit_gas, debit, finalize,
    gas_pubdata,
};
use crate::{DeltaAccumulator, SignatureScheme, StateSnapshot, VerifierError};

// LIQUIDITY POOL OPERATIONS
// ================================================================================================

impl<S: SignatureScheme> TransactionVerifier<S> {
    /// Swaps an exact input amount of one pool asset for the other pool asset.
    pub(super) fn verify_swap(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        swap: &SwapTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let pool = snapshot.pool(swap.pair_index)?;
        let (reserve_in, reserve_out) = pool
            .oriented_reserves(swap.asset_a_id, swap.asset_b_id)
            .ok_or(VerifierError::InvalidPayload("swap assets do not match the pool"))?;
        snapshot.asset(swap.account_index, swap.asset_a_id)?;
        check_amount(&swap.asset_a_amount)?;
        check_amount(&swap.asset_b_min_amount)?;
        if swap.asset_a_amount.is_zero() {
            return Err(VerifierError::InvalidPayload("swap amount must not be zero"));
        }
        self.authenticate(snapshot, tx, swap.account_index, &swap.gas, swap.nonce)?;

        let amount_out = swap_output(&swap.asset_a_amount, reserve_in, reserve_out, pool.fee_rate);
        if amount_out.is_zero() {
            return Err(VerifierError::InsufficientLiquidity(swap.pair_index));
        }
        if amount_out < swap.asset_b_min_amount {
            return Err(VerifierError::SlippageExceeded {
                minimum: swap.asset_b_min_amount.clone(),
                actual: amount_out,
            });
        }

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, swap.account_index, &swap.gas);
        accumulator.add(swap.account_index, swap.asset_a_id, debit(&swap.asset_a_amount));
        accumulator.add(swap.account_index, swap.asset_b_id, credit(&amount_out));
        let (delta_a, delta_b) = if swap.asset_a_id == pool.asset_a_id {
            (credit(&swap.asset_a_amount), debit(&amount_out))
        } else {
            (debit(&amount_out), credit(&swap.asset_a_amount))
        };
        accumulator.add_pool(swap.pair_index, delta_a, delta_b, Default::default());
        credit_gas(&mut accumulator, &swap.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(swap.account_index)
            .pair_index(swap.pair_index)
            .asset_id(swap.asset_a_id)
            .amount(&swap.asset_a_amount)
            .asset_id(swap.asset_b_id)
            .amount(&amount_out);
        let pubdata = gas_pubdata(pubdata, &swap.gas).build();

        finalize(snapshot, tx, accumulator, pubdata)
    }

    /// Deposits both pool assets in exchange for newly minted pool shares.
    pub(super) fn verify_add_liquidity(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        add: &AddLiquidityTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let pool = snapshot.pool(add.pair_index)?;
        snapshot.asset(add.account_index, pool.asset_a_id)?;
        snapshot.asset(add.account_index, pool.asset_b_id)?;
        check_amount(&add.asset_a_amount)?;
        check_amount(&add.asset_b_amount)?;
        if add.asset_a_amount.is_zero() || add.asset_b_amount.is_zero() {
            return Err(VerifierError::InvalidPayload("liquidity amounts must not be zero"));
        }
        self.authenticate(snapshot, tx, add.account_index, &add.gas, add.nonce)?;

        let shares = minted_shares(pool, &add.asset_a_amount, &add.asset_b_amount)
            .ok_or(VerifierError::InsufficientLiquidity(add.pair_index))?;
        if shares.is_zero() {
            return Err(VerifierError::InvalidPayload("liquidity amounts mint no pool shares"));
        }

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, add.account_index, &add.gas);
        accumulator.add(add.account_index, pool.asset_a_id, debit(&add.asset_a_amount));
        accumulator.add(add.account_index, pool.asset_b_id, debit(&add.asset_b_amount));
        accumulator.add_lp(add.account_index, add.pair_index, credit(&shares));
        accumulator.add_pool(
            add.pair_index,
            credit(&add.asset_a_amount),
            credit(&add.asset_b_amount),
            credit(&shares),
        );
        credit_gas(&mut accumulator, &add.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(add.account_index)
            .pair_index(add.pair_index)
            .amount(&add.asset_a_amount)
            .amount(&add.asset_b_amount)
            .amount(&shares);
        let pubdata = gas_pubdata(pubdata, &add.gas).build();

        finalize(snapshot, tx, accumulator, pubdata)
    }

    /// Burns pool shares in exchange for the proportional part of both reserves.
    pub(super) fn verify_remove_liquidity(
        &self,
        snapshot: &StateSnapshot,
        tx: &TransactionInfo,
        remove: &RemoveLiquidityTx,
    ) -> Result<VerifiedTransaction, VerifierError> {
        let pool = snapshot.pool(remove.pair_index)?;
        check_amount(&remove.lp_amount)?;
        check_amount(&remove.asset_a_min_amount)?;
        check_amount(&remove.asset_b_min_amount)?;
        if remove.lp_amount.is_zero() {
            return Err(VerifierError::InvalidPayload("lp amount must not be zero"));
        }
        self.authenticate(snapshot, tx, remove.account_index, &remove.gas, remove.nonce)?;

        if remove.lp_amount > pool.lp_amount {
            return Err(VerifierError::InsufficientLiquidity(remove.pair_index));
        }
        let amount_a = &remove.lp_amount * &pool.asset_a / &pool.lp_amount;
        let amount_b = &remove.lp_amount * &pool.asset_b / &pool.lp_amount;
        for (minimum, actual) in
            [(&remove.asset_a_min_amount, &amount_a), (&remove.asset_b_min_amount, &amount_b)]
        {
            if actual < minimum {
                return Err(VerifierError::SlippageExceeded {
                    minimum: minimum.clone(),
                    actual: actual.clone(),
                });
            }
        }

        let mut accumulator = DeltaAccumulator::new();
        charge_gas(&mut accumulator, remove.account_index, &remove.gas);
        accumulator.add_lp(remove.account_index, remove.pair_index, debit(&remove.lp_amount));
        accumulator.add(remove.account_index, pool.asset_a_id, credit(&amount_a));
        accumulator.add(remove.account_index, pool.asset_b_id, credit(&amount_b));
        accumulator.add_pool(
            remove.pair_index,
            debit(&amount_a),
            debit(&amount_b),
            debit(&remove.lp_amount),
        );
        credit_gas(&mut accumulator, &remove.gas);

        let pubdata = PubdataBuilder::new(tx.tx_type())
            .account_index(remove.account_index)
            .pair_index(remove.pair_index)
            .amount(&amount_a)
            .amount(&amount_b)
            .amount(&remove.lp_amount);
        let pubdata = gas_pubdata(pubdata, &remove.gas).build();

        finalize(snapshot, tx, accumulator, pubdata)
    }
}

// POOL MATH
// ================================================================================================

/// Returns the output amount of a constant-product swap. The fee is taken from the input amount
/// and stays in the pool.
fn swap_output(
    amount_in: &BigUint,
    reserve_in: &BigUint,
    reserve_out: &BigUint,
    fee_rate: u16,
) -> BigUint {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return BigUint::zero();
    }
    let amount_in_after_fee = amount_in * RATE_BASE.saturating_sub(fee_rate as u32);
    let numerator = &amount_in_after_fee * reserve_out;
    let denominator = reserve_in * RATE_BASE + amount_in_after_fee;
    numerator / denominator
}

/// Returns the number of shares minted for a deposit of `amount_a` and `amount_b`.
///
/// The first deposit mints the geometric mean of both amounts. Later deposits mint shares in
/// proportion to the smaller of the two contributions. Returns `None` if the pool has shares but
/// an empty reserve.
fn minted_shares(pool: &LiquidityPool, amount_a: &BigUint, amount_b: &BigUint) -> Option<BigUint> {
    if pool.lp_amount.is_zero() {
        return Some((amount_a * amount_b).sqrt());
    }
    if pool.asset_a.is_zero() || pool.asset_b.is_zero() {
        return None;
    }
    let shares_a = amount_a * &pool.lp_amount / &pool.asset_a;
    let shares_b = amount_b * &pool.lp_amount / &pool.asset_b;
    Some(shares_a.min(shares_b))
}

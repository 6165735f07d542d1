use alloc::vec::Vec;

use anyhow::Context;
use assert_matches::assert_matches;
use rollup_objects::{
    BigInt, BigUint, Digest, Hasher,
    account::{AccountIndex, AssetId, NftIndex, NftInfo, PairIndex, account_name_hash},
    transaction::{
        AddLiquidityTx, AtomicMatchTx, BalanceDelta, CancelOfferTx, CreateCollectionTx,
        CreatePairTx, DepositNftTx, DepositTx, ExecutedTransaction, FullExitNftTx, FullExitTx,
        GasFee, MintNftTx, Offer, OfferType, RegisterTx, RemoveLiquidityTx, SwapTx,
        TransactionInfo, TransferNftTx, TransferTx, TxDetail, WithdrawNftTx, WithdrawTx,
    },
};
use rstest::rstest;

use crate::{
    AccountStateRegistry, OfferRecancelPolicy, RegistryError, TransactionVerifier, VerifierConfig,
    VerifierError, VerifierErrorKind,
    testing::{
        MockSignatureScheme, funded_account, mock_account, mock_public_key, mock_verifier,
        sign_offer, sign_tx,
    },
};

const ALICE: AccountIndex = AccountIndex::new(0);
const BOB: AccountIndex = AccountIndex::new(1);
const GAS: AccountIndex = AccountIndex::new(2);
const ASSET_0: AssetId = AssetId::new(0);
const ASSET_1: AssetId = AssetId::new(1);

// HELPERS
// ================================================================================================

fn verifier() -> TransactionVerifier<MockSignatureScheme> {
    mock_verifier(VerifierConfig::default())
}

/// Verifies a transaction against a snapshot of the registry and applies it.
fn execute(
    registry: &mut AccountStateRegistry,
    verifier: &TransactionVerifier<MockSignatureScheme>,
    tx: &TransactionInfo,
) -> anyhow::Result<ExecutedTransaction> {
    let snapshot = registry.snapshot_for(tx);
    let verified = verifier.verify(&snapshot, tx)?;
    Ok(registry.apply_transaction(&verified)?)
}

fn balance(registry: &AccountStateRegistry, account: AccountIndex, asset: AssetId) -> BigUint {
    registry
        .get_account(account)
        .and_then(|account| account.asset(asset))
        .map(|asset| asset.balance.clone())
        .unwrap_or_default()
}

fn balance_change(detail: &TxDetail) -> (AccountIndex, AssetId, BigInt) {
    match &detail.delta {
        BalanceDelta::Asset { account_index, asset_id, balance, .. } => {
            (*account_index, *asset_id, balance.clone())
        },
        other => panic!("expected an asset delta but got {other:?}"),
    }
}

fn gas(amount: u32) -> GasFee {
    GasFee::new(GAS, ASSET_0, amount)
}

// TRANSFERS
// ================================================================================================

fn transfer_registry() -> AccountStateRegistry {
    AccountStateRegistry::from_state(
        [
            funded_account(0, "alice", &[(0, 1000)]).with_nonce(5),
            mock_account(1, "bob"),
            mock_account(2, "gas"),
        ],
        [],
        [],
    )
}

fn transfer(nonce: u64, amount: u32) -> TransactionInfo {
    sign_tx(TransactionInfo::Transfer(TransferTx {
        account_index: ALICE,
        to_account_index: BOB,
        to_account_name_hash: account_name_hash("bob"),
        asset_id: ASSET_0,
        amount: amount.into(),
        gas: gas(1),
        nonce,
        signature: Vec::new(),
    }))
}

#[test]
fn transfer_emits_ordered_deltas_and_consumes_nonce() -> anyhow::Result<()> {
    let mut registry = transfer_registry();
    let verifier = verifier();
    let tx = transfer(5, 100);

    let snapshot = registry.snapshot_for(&tx);
    let verified = verifier.verify(&snapshot, &tx)?;
    let changes: Vec<_> = verified.details().iter().map(balance_change).collect();
    assert_eq!(
        changes,
        [
            (ALICE, ASSET_0, BigInt::from(-101)),
            (BOB, ASSET_0, BigInt::from(100)),
            (GAS, ASSET_0, BigInt::from(1)),
        ]
    );
    assert_eq!(verified.details().iter().map(|d| d.order).collect::<Vec<_>>(), [0, 1, 2]);
    assert_eq!(verified.details()[0].account_name, "alice");

    let executed = registry.apply_transaction(&verified)?;
    assert_eq!(balance(&registry, ALICE, ASSET_0), BigUint::from(899u32));
    assert_eq!(balance(&registry, BOB, ASSET_0), BigUint::from(100u32));
    assert_eq!(balance(&registry, GAS, ASSET_0), BigUint::from(1u32));
    let nonce_transition = executed.nonce_transition().context("missing nonce transition")?;
    assert_eq!((nonce_transition.before, nonce_transition.after), (5, 6));
    assert_eq!(executed.transitions().len(), 3);

    // replaying the same transaction is rejected by both the verifier and the registry
    let snapshot = registry.snapshot_for(&tx);
    assert_matches!(
        verifier.verify(&snapshot, &tx),
        Err(VerifierError::NonceMismatch { expected: 6, actual: 5, .. })
    );
    assert_matches!(
        registry.apply_transaction(&verified),
        Err(RegistryError::StaleNonce { expected: 5, actual: 6, .. })
    );
    Ok(())
}

#[test]
fn nonce_is_checked_before_balance() {
    let registry = transfer_registry();
    let tx = transfer(4, 1_000_000);

    let err = verifier().verify(&registry.snapshot_for(&tx), &tx).unwrap_err();
    assert_eq!(err.kind(), VerifierErrorKind::NonceMismatch);

    let tx = transfer(5, 1_000_000);
    let err = verifier().verify(&registry.snapshot_for(&tx), &tx).unwrap_err();
    assert_eq!(err.kind(), VerifierErrorKind::InsufficientBalance);
}

#[test]
fn invalid_signatures_are_rejected() {
    let registry = transfer_registry();
    let TransactionInfo::Transfer(mut inner) = transfer(5, 100) else {
        unreachable!()
    };
    inner.amount = BigUint::from(200u32);
    let tx = TransactionInfo::Transfer(inner);

    assert_matches!(
        verifier().verify(&registry.snapshot_for(&tx), &tx),
        Err(VerifierError::InvalidSignature(account)) if account == ALICE
    );
}

#[test]
fn unknown_recipient_is_structural() {
    let registry = transfer_registry();
    let TransactionInfo::Transfer(mut inner) = transfer(5, 100) else {
        unreachable!()
    };
    inner.to_account_index = AccountIndex::new(9);
    let tx = sign_tx(TransactionInfo::Transfer(inner));

    let err = verifier().verify(&registry.snapshot_for(&tx), &tx).unwrap_err();
    assert_matches!(err, VerifierError::MissingAccount(account) if account == AccountIndex::new(9));
    assert_eq!(err.kind(), VerifierErrorKind::Structural);
}

#[test]
fn self_transfer_must_cover_the_amount() -> anyhow::Result<()> {
    let mut registry = transfer_registry();
    let verifier = verifier();
    let self_transfer = |amount: u32| {
        sign_tx(TransactionInfo::Transfer(TransferTx {
            account_index: ALICE,
            to_account_index: ALICE,
            to_account_name_hash: account_name_hash("alice"),
            asset_id: ASSET_0,
            amount: amount.into(),
            gas: gas(1),
            nonce: 5,
            signature: Vec::new(),
        }))
    };

    let tx = self_transfer(1_000_000);
    assert_matches!(
        verifier.verify(&registry.snapshot_for(&tx), &tx),
        Err(VerifierError::InsufficientBalance { account_index, required, .. })
            if account_index == ALICE && required == BigUint::from(1_000_001u32)
    );

    // the whole balance may move, leaving only the fee spent
    execute(&mut registry, &verifier, &self_transfer(999))?;
    assert_eq!(balance(&registry, ALICE, ASSET_0), BigUint::from(999u32));
    assert_eq!(balance(&registry, GAS, ASSET_0), BigUint::from(1u32));
    Ok(())
}

#[test]
fn transfer_of_unheld_asset_is_structural() {
    let registry = transfer_registry();
    let TransactionInfo::Transfer(mut inner) = transfer(5, 100) else {
        unreachable!()
    };
    inner.asset_id = ASSET_1;
    let tx = sign_tx(TransactionInfo::Transfer(inner));

    let err = verifier().verify(&registry.snapshot_for(&tx), &tx).unwrap_err();
    assert_matches!(
        err,
        VerifierError::MissingAsset { account_index, asset_id }
            if account_index == ALICE && asset_id == ASSET_1
    );
    assert_eq!(err.kind(), VerifierErrorKind::Structural);
}

fn withdraw(asset_id: AssetId, amount: u32) -> TransactionInfo {
    sign_tx(TransactionInfo::Withdraw(WithdrawTx {
        account_index: ALICE,
        asset_id,
        amount: amount.into(),
        to_address: [3; 20],
        gas: gas(2),
        nonce: 5,
        signature: Vec::new(),
    }))
}

#[test]
fn withdraw_debits_amount_and_fee() -> anyhow::Result<()> {
    let mut registry = transfer_registry();
    let verifier = verifier();

    let executed = execute(&mut registry, &verifier, &withdraw(ASSET_0, 300))?;
    assert_eq!(balance_change(&executed.details()[0]), (ALICE, ASSET_0, BigInt::from(-302)));
    assert_eq!(balance(&registry, ALICE, ASSET_0), BigUint::from(698u32));
    assert_eq!(balance(&registry, GAS, ASSET_0), BigUint::from(2u32));
    let nonce_transition = executed.nonce_transition().context("missing nonce transition")?;
    assert_eq!((nonce_transition.before, nonce_transition.after), (5, 6));
    Ok(())
}

#[rstest]
#[case::overdraft(ASSET_0, 999, VerifierErrorKind::InsufficientBalance)]
#[case::unheld_asset(ASSET_1, 1, VerifierErrorKind::Structural)]
fn withdraw_is_rejected(
    #[case] asset_id: AssetId,
    #[case] amount: u32,
    #[case] expected: VerifierErrorKind,
) {
    let registry = transfer_registry();
    let tx = withdraw(asset_id, amount);

    let err = verifier().verify(&registry.snapshot_for(&tx), &tx).unwrap_err();
    assert_eq!(err.kind(), expected);
}

#[test]
fn replaying_transactions_is_deterministic() -> anyhow::Result<()> {
    let txs = [transfer(5, 100), transfer(6, 250), transfer(7, 1)];
    let verifier = verifier();

    let mut first = transfer_registry();
    let mut second = transfer_registry();
    for tx in &txs {
        let a = execute(&mut first, &verifier, tx)?;
        let b = execute(&mut second, &verifier, tx)?;
        assert_eq!(a, b);
    }
    assert_eq!(first.state_root(), second.state_root());
    assert_ne!(first.state_root(), transfer_registry().state_root());
    Ok(())
}

// PRIORITY OPERATIONS
// ================================================================================================

#[test]
fn register_and_deposit() -> anyhow::Result<()> {
    let mut registry = transfer_registry();
    let verifier = verifier();

    let register = |index: u32| {
        TransactionInfo::Register(RegisterTx {
            account_index: AccountIndex::new(index),
            account_name: "dave".into(),
            public_key: mock_public_key(AccountIndex::new(index)),
        })
    };
    assert_matches!(
        verifier.verify(&registry.snapshot_for(&register(4)), &register(4)),
        Err(VerifierError::InvalidPayload(_))
    );
    assert_matches!(
        verifier.verify(&registry.snapshot_for(&register(1)), &register(1)),
        Err(VerifierError::AccountAlreadyExists(_))
    );

    let executed = execute(&mut registry, &verifier, &register(3))?;
    assert!(executed.details().is_empty());
    assert!(executed.nonce_transition().is_none());
    assert_eq!(registry.next_account_index(), AccountIndex::new(4));

    let deposit = TransactionInfo::Deposit(DepositTx {
        account_index: AccountIndex::new(3),
        account_name_hash: account_name_hash("dave"),
        asset_id: ASSET_1,
        amount: 50u32.into(),
    });
    execute(&mut registry, &verifier, &deposit)?;
    assert_eq!(balance(&registry, AccountIndex::new(3), ASSET_1), BigUint::from(50u32));

    let wrong_name = TransactionInfo::Deposit(DepositTx {
        account_index: AccountIndex::new(3),
        account_name_hash: account_name_hash("alice"),
        asset_id: ASSET_1,
        amount: 50u32.into(),
    });
    assert_matches!(
        verifier.verify(&registry.snapshot_for(&wrong_name), &wrong_name),
        Err(VerifierError::AccountNameHashMismatch(_))
    );
    Ok(())
}

#[test]
fn full_exit_withdraws_entire_balance() -> anyhow::Result<()> {
    let mut registry = transfer_registry();
    let verifier = verifier();
    let exit = |name: &str| {
        TransactionInfo::FullExit(FullExitTx {
            account_index: ALICE,
            account_name_hash: account_name_hash(name),
            asset_id: ASSET_0,
        })
    };

    let executed = execute(&mut registry, &verifier, &exit("bob"))?;
    assert_eq!(balance_change(&executed.details()[0]).2, BigInt::from(0));
    assert_eq!(balance(&registry, ALICE, ASSET_0), BigUint::from(1000u32));

    let executed = execute(&mut registry, &verifier, &exit("alice"))?;
    assert_eq!(balance_change(&executed.details()[0]).2, BigInt::from(-1000));
    assert_eq!(balance(&registry, ALICE, ASSET_0), BigUint::default());
    Ok(())
}

// OFFER CANCELLATION
// ================================================================================================

fn cancel_offer(offer_id: u64, nonce: u64) -> TransactionInfo {
    sign_tx(TransactionInfo::CancelOffer(CancelOfferTx {
        account_index: ALICE,
        offer_id,
        gas: gas(1),
        nonce,
        signature: Vec::new(),
    }))
}

#[test]
fn cancel_offer_sets_bit_in_offer_slot() -> anyhow::Result<()> {
    let mut registry = AccountStateRegistry::from_state(
        [funded_account(0, "alice", &[(0, 10)]), mock_account(1, "bob"), mock_account(2, "gas")],
        [],
        [],
    );
    let verifier = verifier();

    let executed = execute(&mut registry, &verifier, &cancel_offer(130, 0))?;
    assert_matches!(
        &executed.details()[1].delta,
        BalanceDelta::Asset { asset_id, offer_bitmap: Some(bitmap), .. }
            if *asset_id == ASSET_1 && *bitmap == BigUint::from(4u32)
    );
    let slot = registry.get_account(ALICE).and_then(|a| a.asset(ASSET_1)).cloned();
    assert!(slot.context("offer slot was not created")?.is_offer_finalized(2));

    // an unrelated transfer keeps the bit set
    let transfer = sign_tx(TransactionInfo::Transfer(TransferTx {
        account_index: ALICE,
        to_account_index: BOB,
        to_account_name_hash: account_name_hash("bob"),
        asset_id: ASSET_0,
        amount: 2u32.into(),
        gas: gas(1),
        nonce: 1,
        signature: Vec::new(),
    }));
    execute(&mut registry, &verifier, &transfer)?;
    let slot = registry.get_account(ALICE).and_then(|a| a.asset(ASSET_1)).cloned();
    assert!(slot.context("offer slot was removed")?.is_offer_finalized(2));
    Ok(())
}

#[rstest]
#[case::allow(OfferRecancelPolicy::Allow, true)]
#[case::reject(OfferRecancelPolicy::Reject, false)]
fn recanceling_an_offer_follows_policy(
    #[case] policy: OfferRecancelPolicy,
    #[case] accepted: bool,
) -> anyhow::Result<()> {
    let mut registry = AccountStateRegistry::from_state(
        [funded_account(0, "alice", &[(0, 10)]), mock_account(2, "gas")],
        [],
        [],
    );
    let verifier = mock_verifier(VerifierConfig { offer_recancel_policy: policy });
    execute(&mut registry, &verifier, &cancel_offer(130, 0))?;

    let tx = cancel_offer(130, 1);
    let result = verifier.verify(&registry.snapshot_for(&tx), &tx);
    if accepted {
        let verified = result?;
        registry.apply_transaction(&verified)?;
        let slot = registry.get_account(ALICE).and_then(|a| a.asset(ASSET_1)).cloned();
        assert!(slot.context("offer slot missing")?.is_offer_finalized(2));
    } else {
        assert_matches!(result, Err(VerifierError::OfferAlreadyFinalized { offer_id: 130, .. }));
    }
    Ok(())
}

// LIQUIDITY
// ================================================================================================

#[test]
fn liquidity_pool_lifecycle() -> anyhow::Result<()> {
    let pair = PairIndex::new(7);
    let mut registry = AccountStateRegistry::from_state(
        [funded_account(0, "alice", &[(0, 10_000), (1, 10_000)]), mock_account(2, "gas")],
        [],
        [],
    );
    let verifier = verifier();

    let create_pair = TransactionInfo::CreatePair(CreatePairTx {
        pair_index: pair,
        asset_a_id: ASSET_0,
        asset_b_id: ASSET_1,
        fee_rate: 30,
    });
    execute(&mut registry, &verifier, &create_pair)?;
    assert_matches!(
        verifier.verify(&registry.snapshot_for(&create_pair), &create_pair),
        Err(VerifierError::PoolAlreadyExists(_))
    );

    let add = sign_tx(TransactionInfo::AddLiquidity(AddLiquidityTx {
        account_index: ALICE,
        pair_index: pair,
        asset_a_amount: 4000u32.into(),
        asset_b_amount: 1000u32.into(),
        gas: gas(1),
        nonce: 0,
        signature: Vec::new(),
    }));
    execute(&mut registry, &verifier, &add)?;
    let lp_slot = registry.get_account(ALICE).and_then(|a| a.asset(pair.lp_asset_id())).cloned();
    assert_eq!(lp_slot.context("missing lp slot")?.lp_amount, BigUint::from(2000u32));
    assert_eq!(balance(&registry, ALICE, ASSET_0), BigUint::from(5999u32));

    let swap = |min: u32, nonce: u64| {
        sign_tx(TransactionInfo::Swap(SwapTx {
            account_index: ALICE,
            pair_index: pair,
            asset_a_id: ASSET_0,
            asset_a_amount: 1000u32.into(),
            asset_b_id: ASSET_1,
            asset_b_min_amount: min.into(),
            gas: gas(1),
            nonce,
            signature: Vec::new(),
        }))
    };
    assert_matches!(
        verifier.verify(&registry.snapshot_for(&swap(1000, 1)), &swap(1000, 1)),
        Err(VerifierError::SlippageExceeded { .. })
    );
    execute(&mut registry, &verifier, &swap(150, 1))?;
    // 9_970_000 * 1000 / (4000 * 10_000 + 9_970_000) = 199.5
    assert_eq!(balance(&registry, ALICE, ASSET_1), BigUint::from(9199u32));
    let pool = registry.pool(pair).context("missing pool")?;
    assert_eq!((pool.asset_a.clone(), pool.asset_b.clone()), (5000u32.into(), 801u32.into()));

    let remove = sign_tx(TransactionInfo::RemoveLiquidity(RemoveLiquidityTx {
        account_index: ALICE,
        pair_index: pair,
        lp_amount: 1000u32.into(),
        asset_a_min_amount: 2500u32.into(),
        asset_b_min_amount: 400u32.into(),
        gas: gas(1),
        nonce: 2,
        signature: Vec::new(),
    }));
    execute(&mut registry, &verifier, &remove)?;
    let pool = registry.pool(pair).context("missing pool")?;
    assert_eq!(pool.lp_amount, BigUint::from(1000u32));
    assert_eq!(pool.asset_a, BigUint::from(2500u32));
    assert_eq!(pool.asset_b, BigUint::from(401u32));
    Ok(())
}

// NFTS
// ================================================================================================

fn offer(offer_type: OfferType, offer_id: u64, account_index: AccountIndex, rate: u16) -> Offer {
    sign_offer(Offer {
        offer_type,
        offer_id,
        account_index,
        nft_index: NftIndex::new_unchecked(1),
        asset_id: ASSET_0,
        asset_amount: 500u32.into(),
        treasury_rate: rate,
        signature: Vec::new(),
    })
}

#[test]
fn nft_mint_match_and_withdraw() -> anyhow::Result<()> {
    let nft_index = NftIndex::new_unchecked(1);
    let mut registry = AccountStateRegistry::from_state(
        [
            funded_account(0, "alice", &[(0, 1000)]),
            funded_account(1, "bob", &[(0, 1000)]),
            mock_account(2, "gas"),
        ],
        [],
        [],
    );
    let verifier = verifier();

    let create_collection = sign_tx(TransactionInfo::CreateCollection(CreateCollectionTx {
        account_index: ALICE,
        collection_id: 0,
        gas: gas(1),
        nonce: 0,
        signature: Vec::new(),
    }));
    execute(&mut registry, &verifier, &create_collection)?;
    assert_eq!(registry.get_account(ALICE).map(|a| a.collection_nonce()), Some(1));

    let mint = sign_tx(TransactionInfo::MintNft(MintNftTx {
        account_index: ALICE,
        to_account_index: ALICE,
        to_account_name_hash: account_name_hash("alice"),
        nft_index,
        content_hash: Hasher::hash(b"artwork"),
        collection_id: 0,
        creator_treasury_rate: 100,
        gas: gas(1),
        nonce: 1,
        signature: Vec::new(),
    }));
    execute(&mut registry, &verifier, &mint)?;
    assert!(registry.nft(nft_index).is_owned_by(ALICE));

    let atomic_match = |nonce: u64| {
        sign_tx(TransactionInfo::AtomicMatch(AtomicMatchTx {
            account_index: BOB,
            buy_offer: offer(OfferType::Buy, 130, BOB, 0),
            sell_offer: offer(OfferType::Sell, 3, ALICE, 200),
            gas: gas(1),
            nonce,
            signature: Vec::new(),
        }))
    };
    let executed = execute(&mut registry, &verifier, &atomic_match(0))?;
    assert_eq!(balance_change(&executed.details()[0]), (BOB, ASSET_0, BigInt::from(-501)));
    assert!(registry.nft(nft_index).is_owned_by(BOB));
    // price 500, treasury 2% and royalty 1%, both offers charged once
    assert_eq!(balance(&registry, ALICE, ASSET_0), BigUint::from(998u32 + 485 + 5));
    assert_eq!(balance(&registry, BOB, ASSET_0), BigUint::from(499u32));
    assert_eq!(balance(&registry, GAS, ASSET_0), BigUint::from(2u32 + 10 + 1));

    assert_matches!(
        verifier.verify(&registry.snapshot_for(&atomic_match(1)), &atomic_match(1)),
        Err(VerifierError::NftNotOwned { .. })
    );

    let withdraw = |account_index: AccountIndex, nonce: u64| {
        sign_tx(TransactionInfo::WithdrawNft(WithdrawNftTx {
            account_index,
            nft_index,
            to_address: [7; 20],
            gas: gas(1),
            nonce,
            signature: Vec::new(),
        }))
    };
    assert_matches!(
        verifier.verify(&registry.snapshot_for(&withdraw(ALICE, 2)), &withdraw(ALICE, 2)),
        Err(VerifierError::NftNotOwned { .. })
    );
    execute(&mut registry, &verifier, &withdraw(BOB, 1))?;
    assert!(registry.nft(nft_index).is_empty());
    assert_eq!(registry.nft(nft_index).commitment(), None::<Digest>);
    Ok(())
}

#[test]
fn finalized_offers_cannot_be_matched() -> anyhow::Result<()> {
    let nft_index = NftIndex::new_unchecked(1);
    let mut registry = AccountStateRegistry::from_state(
        [
            funded_account(0, "alice", &[(0, 1000)]),
            funded_account(1, "bob", &[(0, 1000)]),
            mock_account(2, "gas"),
        ],
        [],
        [NftInfo {
            nft_index,
            creator_account_index: ALICE,
            owner_account_index: Some(ALICE),
            content_hash: Digest::default(),
            collection_id: 0,
            creator_treasury_rate: 0,
        }],
    );
    let verifier = verifier();

    let cancel = sign_tx(TransactionInfo::CancelOffer(CancelOfferTx {
        account_index: BOB,
        offer_id: 130,
        gas: gas(1),
        nonce: 0,
        signature: Vec::new(),
    }));
    execute(&mut registry, &verifier, &cancel)?;

    let atomic_match = sign_tx(TransactionInfo::AtomicMatch(AtomicMatchTx {
        account_index: BOB,
        buy_offer: offer(OfferType::Buy, 130, BOB, 0),
        sell_offer: offer(OfferType::Sell, 3, ALICE, 0),
        gas: gas(1),
        nonce: 1,
        signature: Vec::new(),
    }));
    assert_matches!(
        verifier.verify(&registry.snapshot_for(&atomic_match), &atomic_match),
        Err(VerifierError::OfferAlreadyFinalized { offer_id: 130, .. })
    );
    Ok(())
}

fn owned_nft(nft_index: NftIndex, owner: AccountIndex) -> NftInfo {
    NftInfo {
        nft_index,
        creator_account_index: BOB,
        owner_account_index: Some(owner),
        content_hash: Hasher::hash(b"artwork"),
        collection_id: 2,
        creator_treasury_rate: 50,
    }
}

fn nft_registry(nft: NftInfo) -> AccountStateRegistry {
    AccountStateRegistry::from_state(
        [
            funded_account(0, "alice", &[(0, 1000)]).with_nonce(5),
            mock_account(1, "bob"),
            mock_account(2, "gas"),
        ],
        [],
        [nft],
    )
}

#[test]
fn deposit_nft_fills_an_empty_slot_only() -> anyhow::Result<()> {
    let nft_index = NftIndex::new_unchecked(7);
    let mut registry = transfer_registry();
    let verifier = verifier();
    let deposit = TransactionInfo::DepositNft(DepositNftTx {
        account_index: ALICE,
        account_name_hash: account_name_hash("alice"),
        nft_index,
        creator_account_index: BOB,
        content_hash: Hasher::hash(b"artwork"),
        collection_id: 2,
        creator_treasury_rate: 50,
    });

    let executed = execute(&mut registry, &verifier, &deposit)?;
    assert_eq!(executed.details().len(), 1);
    assert!(executed.nonce_transition().is_none());
    assert_eq!(registry.nft(nft_index), owned_nft(nft_index, ALICE));

    assert_matches!(
        verifier.verify(&registry.snapshot_for(&deposit), &deposit),
        Err(VerifierError::NftAlreadyExists(index)) if index == nft_index
    );
    Ok(())
}

#[test]
fn transfer_nft_moves_ownership() -> anyhow::Result<()> {
    let nft_index = NftIndex::new_unchecked(7);
    let mut registry = nft_registry(owned_nft(nft_index, ALICE));
    let verifier = verifier();
    let transfer_nft = |from: AccountIndex, to: AccountIndex, to_name: &str, nonce: u64| {
        sign_tx(TransactionInfo::TransferNft(TransferNftTx {
            account_index: from,
            to_account_index: to,
            to_account_name_hash: account_name_hash(to_name),
            nft_index,
            gas: gas(1),
            nonce,
            signature: Vec::new(),
        }))
    };

    let stolen = transfer_nft(BOB, BOB, "bob", 0);
    assert_matches!(
        verifier.verify(&registry.snapshot_for(&stolen), &stolen),
        Err(VerifierError::NftNotOwned { account_index, .. }) if account_index == BOB
    );
    let misaddressed = transfer_nft(ALICE, BOB, "carol", 5);
    let err = verifier.verify(&registry.snapshot_for(&misaddressed), &misaddressed).unwrap_err();
    assert_eq!(err.kind(), VerifierErrorKind::Structural);

    execute(&mut registry, &verifier, &transfer_nft(ALICE, BOB, "bob", 5))?;
    assert!(registry.nft(nft_index).is_owned_by(BOB));
    assert_eq!(balance(&registry, ALICE, ASSET_0), BigUint::from(999u32));
    assert_eq!(balance(&registry, GAS, ASSET_0), BigUint::from(1u32));
    Ok(())
}

fn full_exit_nft(account_index: AccountIndex, name: &str, nft_index: NftIndex) -> TransactionInfo {
    TransactionInfo::FullExitNft(FullExitNftTx {
        account_index,
        account_name_hash: account_name_hash(name),
        nft_index,
    })
}

#[test]
fn full_exit_nft_empties_the_slot_of_its_owner() -> anyhow::Result<()> {
    let nft_index = NftIndex::new_unchecked(7);
    let mut registry = nft_registry(owned_nft(nft_index, ALICE));

    let executed = execute(&mut registry, &verifier(), &full_exit_nft(ALICE, "alice", nft_index))?;
    assert_eq!(executed.details().len(), 1);
    assert!(registry.nft(nft_index).is_empty());
    Ok(())
}

#[rstest]
#[case::not_the_owner(BOB, "bob")]
#[case::name_hash_mismatch(ALICE, "bob")]
fn full_exit_nft_without_ownership_changes_nothing(
    #[case] account_index: AccountIndex,
    #[case] name: &str,
) -> anyhow::Result<()> {
    let nft_index = NftIndex::new_unchecked(7);
    let mut registry = nft_registry(owned_nft(nft_index, ALICE));
    let root = registry.state_root();

    let exit = full_exit_nft(account_index, name, nft_index);
    let executed = execute(&mut registry, &verifier(), &exit)?;
    assert_eq!(executed.details().len(), 1);
    assert_eq!(registry.nft(nft_index), owned_nft(nft_index, ALICE));
    assert_eq!(registry.state_root(), root);
    Ok(())
}

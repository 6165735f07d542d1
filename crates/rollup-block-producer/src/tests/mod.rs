use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use rollup_objects::{
    account::{AccountIndex, AccountState, AssetId, account_name_hash},
    block::{Block, BlockHeight, BlockStatus},
    transaction::{GasFee, TransactionInfo, TransferTx, TxType},
};
use rollup_tx::{
    AccountStateRegistry, DirtyState, OfferRecancelPolicy, VerifierConfig, VerifierErrorKind,
    testing::{MockSignatureScheme, funded_account, mock_account, sign_tx},
};
use rstest::rstest;

use crate::{
    AccountStore, BlockAssemblerError, BlockProducer, BlockProducerConfig, BlockProducerError,
    BlockStore, MemoryStore, RecancelPolicy,
};

const ALICE: AccountIndex = AccountIndex::new(0);
const BOB: AccountIndex = AccountIndex::new(1);
const CAROL: AccountIndex = AccountIndex::new(2);
const GAS: AccountIndex = AccountIndex::new(3);
const ASSET: AssetId = AssetId::new(0);

// HELPERS
// ================================================================================================

fn config(block_capacity: usize, max_height_lag: u64) -> BlockProducerConfig {
    BlockProducerConfig {
        block_capacity,
        seal_timeout_secs: 600,
        stall_timeout_secs: 600,
        max_height_lag,
        offer_recancel_policy: RecancelPolicy::Allow,
    }
}

fn accounts() -> Vec<AccountState> {
    vec![
        funded_account(0, "alice", &[(0, 10_000)]),
        funded_account(1, "bob", &[(0, 10_000)]),
        mock_account(2, "carol"),
        mock_account(3, "gas"),
    ]
}

fn registry() -> AccountStateRegistry {
    AccountStateRegistry::from_state(accounts(), [], [])
}

fn producer(config: &BlockProducerConfig, now: Instant) -> BlockProducer<MockSignatureScheme> {
    BlockProducer::new(config, MockSignatureScheme, registry(), Block::genesis(), now)
}

fn transfer(from: AccountIndex, to: AccountIndex, nonce: u64, amount: u32) -> TransactionInfo {
    let name = match to.as_u32() {
        0 => "alice",
        1 => "bob",
        _ => "carol",
    };
    sign_tx(TransactionInfo::Transfer(TransferTx {
        account_index: from,
        to_account_index: to,
        to_account_name_hash: account_name_hash(name),
        asset_id: ASSET,
        amount: amount.into(),
        gas: GasFee::new(GAS, ASSET, 1u32),
        nonce,
        signature: vec![],
    }))
}

// SEALING
// ================================================================================================

#[test]
fn idle_block_is_sealed_on_timeout_and_padded() -> anyhow::Result<()> {
    let start = Instant::now();
    let config = config(50, 10);
    let mut producer = producer(&config, start);

    for nonce in 0..3 {
        let receipt = producer.submit(transfer(ALICE, CAROL, nonce, 10), start, 1)?;
        assert_eq!(receipt.block_height, BlockHeight::new(1));
        assert_eq!(receipt.position, nonce as usize);
    }

    assert_eq!(producer.tick(start + Duration::from_secs(599), 1)?, None);
    assert!(producer.take_witnesses().is_empty());

    let sealed = producer.tick(start + Duration::from_secs(600), 2)?;
    assert_eq!(sealed, Some(BlockHeight::new(1)));

    let witnesses = producer.take_witnesses();
    assert_eq!(witnesses.len(), 1);
    let witness = &witnesses[0];
    assert_eq!(witness.capacity(), 50);
    assert_eq!(witness.transactions().len(), 50);
    assert_eq!(witness.num_transactions(), 3);
    assert!(witness.transactions()[..3].iter().all(|tx| tx.tx_type() == TxType::Transfer));
    assert_eq!(witness.state_root(), producer.state_root());

    let block = producer.assembler().block(BlockHeight::new(1)).expect("block is tracked");
    assert_eq!(block.transactions().len(), 3);
    assert_eq!(block.timestamp(), 2);
    assert_eq!(producer.assembler().next_height(), BlockHeight::new(2));
    Ok(())
}

#[test]
fn full_block_is_sealed_immediately() -> anyhow::Result<()> {
    let now = Instant::now();
    let mut producer = producer(&config(2, 10), now);

    let first = producer.submit(transfer(ALICE, CAROL, 0, 10), now, 1)?;
    let second = producer.submit(transfer(BOB, CAROL, 0, 10), now, 1)?;
    let third = producer.submit(transfer(ALICE, CAROL, 1, 10), now, 1)?;

    assert_eq!((first.block_height, first.position), (BlockHeight::new(1), 0));
    assert_eq!((second.block_height, second.position), (BlockHeight::new(1), 1));
    assert_eq!((third.block_height, third.position), (BlockHeight::new(2), 0));

    let witnesses = producer.take_witnesses();
    assert_eq!(witnesses.len(), 1);
    assert_eq!(witnesses[0].num_transactions(), 2);
    assert_eq!(producer.assembler().pending_transactions().len(), 1);
    Ok(())
}

#[test]
fn rejected_transaction_leaves_state_unchanged() -> anyhow::Result<()> {
    let now = Instant::now();
    let mut producer = producer(&config(50, 10), now);
    let root = producer.state_root();

    let result = producer.submit(transfer(ALICE, CAROL, 7, 10), now, 1);
    assert_matches!(
        &result,
        Err(BlockProducerError::Rejected(error))
            if error.kind() == VerifierErrorKind::NonceMismatch
    );
    assert_eq!(producer.state_root(), root);
    assert!(producer.assembler().pending_transactions().is_empty());

    let overdraft = producer.submit(transfer(ALICE, CAROL, 0, 20_000), now, 1);
    assert_matches!(
        overdraft,
        Err(BlockProducerError::Rejected(error))
            if error.kind() == VerifierErrorKind::InsufficientBalance
    );
    assert_eq!(producer.state_root(), root);
    Ok(())
}

// BATCHES
// ================================================================================================

#[rstest]
#[case::capacity_larger_than_batch(50)]
#[case::batch_spans_blocks(3)]
fn batch_matches_sequential_submission(#[case] capacity: usize) -> anyhow::Result<()> {
    let txs = vec![
        transfer(ALICE, CAROL, 0, 10),
        transfer(BOB, CAROL, 0, 20),
        // spends more than the two transfers before it credited to carol
        transfer(CAROL, ALICE, 0, 40),
        transfer(ALICE, BOB, 1, 30),
        transfer(BOB, ALICE, 1, 40),
        transfer(ALICE, CAROL, 5, 1),
        transfer(ALICE, CAROL, 2, 50),
    ];
    let now = Instant::now();
    let config = config(capacity, 10);

    let mut sequential = producer(&config, now);
    let expected: Vec<_> =
        txs.iter().map(|tx| sequential.submit(tx.clone(), now, 1).ok()).collect();
    let mut batched = producer(&config, now);
    let actual: Vec<_> =
        batched.submit_batch(&txs, now, 1).into_iter().map(Result::ok).collect();

    assert_eq!(actual, expected);
    assert_eq!(expected.iter().filter(|receipt| receipt.is_none()).count(), 2);
    assert_eq!(batched.state_root(), sequential.state_root());
    assert_eq!(batched.take_witnesses(), sequential.take_witnesses());
    Ok(())
}

// PERSISTENCE
// ================================================================================================

#[test]
fn unpersisted_blocks_hold_back_the_assembler() -> anyhow::Result<()> {
    let now = Instant::now();
    let mut store = MemoryStore::new();
    store.upsert_state(&DirtyState { accounts: accounts(), ..Default::default() })?;

    let mut producer =
        BlockProducer::from_store(&config(1, 2), MockSignatureScheme, &mut store, now)?;
    assert_eq!(store.num_blocks(), 1);
    assert_eq!(producer.state_root(), registry().state_root());

    producer.submit(transfer(ALICE, CAROL, 0, 10), now, 1)?;
    producer.submit(transfer(ALICE, CAROL, 1, 10), now, 1)?;
    assert_matches!(
        producer.submit(transfer(ALICE, CAROL, 2, 10), now, 1),
        Err(BlockProducerError::Assembler(BlockAssemblerError::HeightLagExceeded { .. }))
    );

    assert_eq!(producer.persist(&mut store)?, Some(BlockHeight::new(2)));
    assert_eq!(store.num_blocks(), 3);
    producer.submit(transfer(ALICE, CAROL, 2, 10), now, 1)?;

    let carol = store.load_account(CAROL)?.expect("carol is stored");
    assert_eq!(carol.asset(ASSET).map(|asset| asset.balance.clone()), Some(20u32.into()));
    Ok(())
}

#[test]
fn producer_resumes_from_store() -> anyhow::Result<()> {
    let now = Instant::now();
    let config = config(2, 10);
    let mut store = MemoryStore::new();
    store.append_block(&Block::genesis())?;

    let mut producer = producer(&config, now);
    producer.submit(transfer(ALICE, CAROL, 0, 10), now, 1)?;
    producer.submit(transfer(BOB, CAROL, 0, 10), now, 1)?;
    producer.submit(transfer(ALICE, BOB, 1, 10), now, 1)?;
    producer.persist(&mut store)?;

    let resumed = BlockProducer::from_store(&config, MockSignatureScheme, &mut store, now)?;
    assert_eq!(resumed.assembler().next_height(), BlockHeight::new(2));
    let sealed = producer.assembler().block(BlockHeight::new(1)).expect("block is tracked");
    assert_eq!(resumed.assembler().prev_state_root(), sealed.state_root());
    assert_eq!(resumed.state_root(), sealed.state_root());
    assert_eq!(resumed.registry().get_account(ALICE).map(|account| account.nonce()), Some(1));
    Ok(())
}

// LIFECYCLE
// ================================================================================================

#[test]
fn block_lifecycle_is_persisted_and_stalls_are_reported() -> anyhow::Result<()> {
    let start = Instant::now();
    let mut store = MemoryStore::new();
    store.append_block(&Block::genesis())?;
    let mut producer = producer(&config(1, 10), start);

    producer.submit(transfer(ALICE, CAROL, 0, 10), start, 1)?;
    let height = BlockHeight::new(1);
    producer.block_committed(height, start)?;

    producer.tick(start + Duration::from_secs(600), 1)?;
    assert!(producer.stalled_blocks().is_empty());
    producer.tick(start + Duration::from_secs(601), 1)?;
    assert_eq!(producer.stalled_blocks(), [height]);

    producer.persist(&mut store)?;
    assert_eq!(store.load_block(height)?.map(|block| block.status()), Some(BlockStatus::Committed));

    let later = start + Duration::from_secs(700);
    producer.block_proved(height, later)?;
    assert!(producer.stalled_blocks().is_empty());
    producer.block_executed(height, later)?;
    assert_matches!(
        producer.block_executed(height, later),
        Err(BlockProducerError::Assembler(BlockAssemblerError::UnknownBlock(_)))
    );

    producer.persist(&mut store)?;
    assert_eq!(store.load_block(height)?.map(|block| block.status()), Some(BlockStatus::Executed));
    Ok(())
}

#[test]
fn recancel_policy_is_taken_from_config() {
    let config = BlockProducerConfig {
        offer_recancel_policy: RecancelPolicy::Reject,
        ..BlockProducerConfig::default()
    };
    assert_eq!(
        config.verifier_config(),
        VerifierConfig { offer_recancel_policy: OfferRecancelPolicy::Reject }
    );
}

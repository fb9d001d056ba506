//! Cross-cutting lifecycle properties checked end to end.

use std::sync::Arc;

use keel_traits::EngineMessage;

use crate::ChainHarness;

const GENESIS: &[u8] = &[0x0a, 0x0b, 0x0c];

#[tokio::test]
async fn get_block_serves_one_handle_per_id() {
    let mut harness = ChainHarness::start(GENESIS).await.expect("boot");
    let genesis_id = harness.vm().last_accepted().expect("last accepted");

    let first = harness.vm().get_block(genesis_id).await.expect("get");
    let second = harness.vm().get_block(genesis_id).await.expect("get");
    assert!(Arc::ptr_eq(&first, &second));

    harness.propose(b"payload").expect("propose");
    let block = harness.advance().await.expect("advance");
    let fetched = harness.vm().get_block(block.id()).await.expect("get");
    assert!(Arc::ptr_eq(&block, &fetched));
}

#[tokio::test]
async fn parse_block_reuses_the_cached_handle() {
    let mut harness = ChainHarness::start(GENESIS).await.expect("boot");

    harness.propose(b"payload").expect("propose");
    let block = harness.vm().build_block().await.expect("build");
    let bytes = block.bytes().clone();

    let reparsed = harness.vm().parse_block(&bytes).await.expect("parse");
    assert!(Arc::ptr_eq(&block, &reparsed));
}

#[tokio::test]
async fn accepted_chain_stays_monotonic() {
    let mut harness = ChainHarness::start(GENESIS).await.expect("boot");

    let mut previous = {
        let genesis_id = harness.vm().last_accepted().expect("last accepted");
        harness.vm().get_block(genesis_id).await.expect("genesis")
    };

    for round in 0u8..3 {
        harness.propose(&[round]).expect("propose");
        let block = harness.advance().await.expect("advance");

        assert_eq!(block.height(), previous.height() + 1);
        assert!(block.timestamp() >= previous.timestamp());
        assert_eq!(block.parent(), previous.id());
        assert_eq!(
            harness.vm().get_block_id_at_height(block.height()).await.expect("height index"),
            block.id()
        );
        previous = block;
    }
}

#[tokio::test]
async fn build_rearms_the_signal_while_work_remains() {
    let mut harness = ChainHarness::start(GENESIS).await.expect("boot");

    harness.propose(b"first").expect("propose");
    harness.propose(b"second").expect("propose");

    // The slot coalesces the two proposals into one pending signal.
    assert_eq!(harness.try_signal(), Some(EngineMessage::PendingTxs));
    assert_eq!(harness.try_signal(), None);

    // A build consumes one item; the backend re-arms because one remains.
    harness.advance().await.expect("advance");
    assert_eq!(harness.try_signal(), Some(EngineMessage::PendingTxs));

    // The final build drains the queue; no further signal is raised.
    harness.advance().await.expect("advance");
    assert_eq!(harness.try_signal(), None);
}

#[tokio::test]
async fn shutdown_completes_cleanly() {
    let mut harness = ChainHarness::start(GENESIS).await.expect("boot");

    harness.propose(b"pending").expect("propose");
    let block = harness.vm().build_block().await.expect("build");
    harness.vm().verify(&block).await.expect("verify");

    harness.vm().shutdown().await.expect("shutdown");
}

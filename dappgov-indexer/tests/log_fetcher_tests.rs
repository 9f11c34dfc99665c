//! Windowed log retrieval against the in-memory chain

mod common;

use alloy_primitives::Address;
use alloy_sol_types::SolEvent;
use anyhow::Result;
use dappgov_indexer::adapters::MemoryChain;
use dappgov_indexer::contracts::governor::{ProposalCreated, VoteCast};
use dappgov_indexer::core::{address_topic, BlockWindow, IndexerError, LogFilter, NetworkError, RawLog};
use dappgov_indexer::processors::LogFetcher;
use proptest::prelude::*;
use std::sync::Arc;

use common::*;

fn chain_with_proposals(head: u64, blocks: &[u64]) -> MemoryChain {
    let mut chain = MemoryChain::new(CHAIN_ID, head);
    for (i, block) in blocks.iter().enumerate() {
        add_proposal(&mut chain, i as u64 + 1, *block, i as u64 % 3, 0);
    }
    chain
}

fn unbounded(chain: &MemoryChain, from: u64, to: u64) -> Vec<RawLog> {
    chain.all_logs(&LogFilter {
        address: governor(),
        topics: vec![Some(ProposalCreated::SIGNATURE_HASH)],
        from_block: from,
        to_block: to,
    })
}

#[tokio::test]
async fn test_windowed_scan_matches_single_query() -> Result<()> {
    let chain = Arc::new(chain_with_proposals(25_000, &[0, 9_999, 10_000, 10_001, 19_999, 24_000, 25_000]));
    let expected = unbounded(&chain, 0, 25_000);
    assert_eq!(expected.len(), 7);

    for window in [1_000, 9_999, 10_000, 30_000] {
        let fetcher = LogFetcher::new(chain.clone(), window);
        let logs = fetcher
            .fetch_logs(governor(), ProposalCreated::SIGNATURE_HASH, &[], 0)
            .await?;
        assert_eq!(logs, expected, "window {window}");
    }
    Ok(())
}

#[tokio::test]
async fn test_windows_cover_range_exactly_once() -> Result<()> {
    let chain = Arc::new(MemoryChain::new(CHAIN_ID, 25_000));
    let fetcher = LogFetcher::new(chain.clone(), 10_000);
    fetcher
        .fetch_logs(governor(), ProposalCreated::SIGNATURE_HASH, &[], 5)
        .await?;

    assert_eq!(
        chain.log_queries(),
        vec![
            BlockWindow { from: 5, to: 10_004 },
            BlockWindow { from: 10_005, to: 20_004 },
            BlockWindow { from: 20_005, to: 25_000 },
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_start_past_head_is_empty_without_queries() -> Result<()> {
    let chain = Arc::new(chain_with_proposals(100, &[50]));
    let fetcher = LogFetcher::new(chain.clone(), 10);
    let logs = fetcher
        .fetch_logs(governor(), ProposalCreated::SIGNATURE_HASH, &[], 101)
        .await?;
    assert!(logs.is_empty());
    assert!(chain.log_queries().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_window_fails_whole_scan() {
    let mut chain = chain_with_proposals(30, &[1, 25]);
    chain.fail_logs_at(15);
    let fetcher = LogFetcher::new(Arc::new(chain), 10);

    let err = fetcher
        .fetch_logs(governor(), ProposalCreated::SIGNATURE_HASH, &[], 0)
        .await
        .unwrap_err();
    match err {
        IndexerError::Network(NetworkError::LogWindow { from, to, .. }) => {
            assert_eq!((from, to), (10, 19));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_indexed_topic_filters_other_voters() -> Result<()> {
    let mut chain = MemoryChain::new(CHAIN_ID, 50);
    chain.emit(governor(), &vote(1, 1, 10), 10, 0);
    let mut other = vote(1, 0, 3);
    other.voter = Address::repeat_byte(0xee);
    chain.emit(governor(), &other, 11, 0);
    // Same event from a different contract
    chain.emit(Address::repeat_byte(0x01), &vote(1, 1, 10), 12, 0);

    let fetcher = LogFetcher::new(Arc::new(chain), 20);
    let logs = fetcher
        .fetch_logs(governor(), VoteCast::SIGNATURE_HASH, &[Some(address_topic(voter()))], 0)
        .await?;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].block_number, 10);
    Ok(())
}

proptest! {
    #[test]
    fn prop_any_window_size_yields_unbounded_result(
        blocks in prop::collection::vec(0u64..2_000, 0..20),
        window in 1u64..2_500,
        from in 0u64..2_100,
    ) {
        let chain = Arc::new(chain_with_proposals(2_000, &blocks));
        let expected = unbounded(&chain, from, 2_000);
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let logs = runtime
            .block_on(LogFetcher::new(chain.clone(), window).fetch_logs(
                governor(),
                ProposalCreated::SIGNATURE_HASH,
                &[],
                from,
            ))
            .unwrap();
        prop_assert_eq!(logs, expected);
    }
}

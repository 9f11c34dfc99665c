//! Chunked log retrieval
//!
//! Providers cap the block range (or result count) of a single `eth_getLogs`
//! call, so a scan from a deploy block to the head is split into consecutive
//! windows. Windowing never filters: the concatenated output is identical to
//! one unbounded query over the same range.

use alloy_primitives::{Address, B256};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::{BlockWindow, ChainReader, IndexerError, IndexerResult, LogFilter, NetworkError, RawLog};

/// Partition `[from, to]` into consecutive windows no wider than `max_window`
pub fn block_windows(from: u64, to: u64, max_window: u64) -> Vec<BlockWindow> {
    let max_window = max_window.max(1);
    let mut windows = Vec::new();
    if from > to {
        return windows;
    }
    let mut start = from;
    loop {
        let end = start.saturating_add(max_window - 1).min(to);
        windows.push(BlockWindow { from: start, to: end });
        if end == to {
            break;
        }
        start = end + 1;
    }
    windows
}

/// Fetches logs for one address and topic filter in bounded windows
pub struct LogFetcher<C: ChainReader + ?Sized> {
    chain: Arc<C>,
    max_window: u64,
}

impl<C: ChainReader + ?Sized> Clone for LogFetcher<C> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            max_window: self.max_window,
        }
    }
}

impl<C: ChainReader + ?Sized> LogFetcher<C> {
    pub fn new(chain: Arc<C>, max_window: u64) -> Self {
        Self {
            chain,
            max_window: max_window.max(1),
        }
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    /// All logs from `from_block` to the current head matching `topic0` and
    /// the optional indexed topics that follow it.
    ///
    /// Returns an empty list when `from_block` is past the head. A failed
    /// window fails the whole call.
    pub async fn fetch_logs(
        &self,
        address: Address,
        topic0: B256,
        indexed_topics: &[Option<B256>],
        from_block: u64,
    ) -> IndexerResult<Vec<RawLog>> {
        let head = self.chain.block_number().await?;
        if from_block > head {
            debug!(%address, from_block, head, "start block past head, nothing to fetch");
            return Ok(Vec::new());
        }

        let mut topics = Vec::with_capacity(indexed_topics.len() + 1);
        topics.push(Some(topic0));
        topics.extend_from_slice(indexed_topics);

        let windows = block_windows(from_block, head, self.max_window);
        let mut logs = Vec::new();
        for window in &windows {
            let filter = LogFilter {
                address,
                topics: topics.clone(),
                from_block: window.from,
                to_block: window.to,
            };
            let batch = self.chain.get_logs(&filter).await.map_err(|e| {
                warn!(%address, from = window.from, to = window.to, error = %e, "log window failed");
                IndexerError::Network(NetworkError::LogWindow {
                    from: window.from,
                    to: window.to,
                    reason: e.to_string(),
                })
            })?;
            logs.extend(batch);
        }

        debug!(
            %address,
            %topic0,
            windows = windows.len(),
            logs = logs.len(),
            "fetched logs"
        );
        Ok(logs)
    }
}

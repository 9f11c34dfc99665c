//! Core trait abstractions (ports)

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;

use super::error::IndexerResult;
use super::types::{LogFilter, RawLog};
use crate::models::content::{ContentRequest, ContentResponse};

/// Read-side chain access. Everything the projectors know about the chain
/// comes through this port.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Chain id of the connected network
    async fn chain_id(&self) -> IndexerResult<u64>;

    /// Latest block number
    async fn block_number(&self) -> IndexerResult<u64>;

    /// Timestamp (seconds) of the given block
    async fn block_timestamp(&self, block_number: u64) -> IndexerResult<u64>;

    /// Logs matching `filter`, in chain order
    async fn get_logs(&self, filter: &LogFilter) -> IndexerResult<Vec<RawLog>>;

    /// Read-only contract call at `block` (latest when `None`)
    async fn call(&self, to: Address, data: Bytes, block: Option<u64>) -> IndexerResult<Bytes>;
}

/// Request/response bridge to the external content-retrieval capability
#[async_trait]
pub trait ContentGateway: Send + Sync {
    async fn fetch(&self, request: &ContentRequest) -> IndexerResult<ContentResponse>;
}

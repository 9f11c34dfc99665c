//! Lightweight EVM JSON-RPC client
//!
//! Implements only the read methods the projectors need, over a blocking
//! `ureq` agent driven from the tokio blocking pool.

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::config::RpcConfig;
use crate::core::{ChainReader, IndexerResult, LogFilter, NetworkError, RawLog};

/// Lightweight RPC client for EVM chains
pub struct LightRpcClient {
    url: String,
    agent: ureq::Agent,
    next_id: AtomicU64,
}

/// RPC response wrapper
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// RPC error structure
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Log entry as returned by `eth_getLogs`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    topics: Vec<B256>,
    data: Bytes,
    block_number: String,
    log_index: String,
    #[serde(default)]
    removed: bool,
}

/// Subset of a block header
#[derive(Debug, Deserialize)]
struct RpcBlock {
    timestamp: String,
}

/// Parse a `0x`-prefixed hex quantity
pub fn parse_quantity(raw: &str) -> Result<u64, NetworkError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| NetworkError::InvalidResponse(format!("quantity without 0x prefix: {raw}")))?;
    if digits.is_empty() {
        return Err(NetworkError::InvalidResponse("empty quantity".to_string()));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| NetworkError::InvalidResponse(format!("bad quantity {raw}: {e}")))
}

fn quantity(value: u64) -> String {
    format!("{value:#x}")
}

impl LightRpcClient {
    /// Create a new lightweight RPC client
    pub fn new(config: &RpcConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(config.connect_timeout_secs))
            .timeout_read(Duration::from_secs(config.read_timeout_secs))
            .build();

        Self {
            url: config.url.clone(),
            agent,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make a JSON-RPC call
    async fn call_method<T>(&self, method: &str, params: Value) -> IndexerResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });

        debug!("RPC call: {} with params: {}", method, params);

        // ureq is blocking
        let response_body = tokio::task::spawn_blocking({
            let agent = self.agent.clone();
            let url = self.url.clone();
            let body = request_body.to_string();

            move || {
                let response = agent
                    .post(&url)
                    .set("Content-Type", "application/json")
                    .send_string(&body)
                    .map_err(NetworkError::from)?;

                response
                    .into_string()
                    .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))
            }
        })
        .await
        .map_err(|e| NetworkError::ConnectionFailed(format!("RPC task failed: {e}")))??;

        let rpc_response: RpcResponse<T> = serde_json::from_str(&response_body)?;

        if let Some(error) = rpc_response.error {
            return Err(NetworkError::Rpc {
                code: error.code,
                message: error.message,
            }
            .into());
        }

        rpc_response
            .result
            .ok_or_else(|| NetworkError::InvalidResponse(format!("no result for {method}")).into())
    }
}

#[async_trait]
impl ChainReader for LightRpcClient {
    async fn chain_id(&self) -> IndexerResult<u64> {
        let raw: String = self.call_method("eth_chainId", json!([])).await?;
        Ok(parse_quantity(&raw)?)
    }

    async fn block_number(&self) -> IndexerResult<u64> {
        let raw: String = self.call_method("eth_blockNumber", json!([])).await?;
        Ok(parse_quantity(&raw)?)
    }

    async fn block_timestamp(&self, block_number: u64) -> IndexerResult<u64> {
        let block: Option<RpcBlock> = self
            .call_method("eth_getBlockByNumber", json!([quantity(block_number), false]))
            .await?;
        let block = block
            .ok_or_else(|| NetworkError::InvalidResponse(format!("block {block_number} not found")))?;
        Ok(parse_quantity(&block.timestamp)?)
    }

    async fn get_logs(&self, filter: &LogFilter) -> IndexerResult<Vec<RawLog>> {
        let topics: Vec<Value> = filter
            .topics
            .iter()
            .map(|topic| match topic {
                Some(topic) => json!(topic),
                None => Value::Null,
            })
            .collect();
        let params = json!([{
            "address": filter.address,
            "topics": topics,
            "fromBlock": quantity(filter.from_block),
            "toBlock": quantity(filter.to_block),
        }]);

        let logs: Vec<RpcLog> = self.call_method("eth_getLogs", params).await?;
        logs.into_iter()
            .filter(|log| !log.removed)
            .map(|log| -> IndexerResult<RawLog> {
                Ok(RawLog {
                    topics: log.topics,
                    data: log.data,
                    block_number: parse_quantity(&log.block_number)?,
                    log_index: parse_quantity(&log.log_index)?,
                })
            })
            .collect()
    }

    async fn call(&self, to: Address, data: Bytes, block: Option<u64>) -> IndexerResult<Bytes> {
        let block_tag = block.map_or_else(|| "latest".to_string(), quantity);
        let params = json!([{ "to": to, "data": data }, block_tag]);
        self.call_method("eth_call", params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
        assert!(parse_quantity("1b4").is_err());
        assert!(parse_quantity("0x").is_err());
    }

    #[test]
    fn formats_quantities_without_padding() {
        assert_eq!(quantity(0), "0x0");
        assert_eq!(quantity(436), "0x1b4");
    }

    #[test]
    fn rpc_log_deserializes() {
        let raw = r#"{
            "address": "0x0000000000000000000000000000000000000001",
            "topics": ["0x1111111111111111111111111111111111111111111111111111111111111111"],
            "data": "0x0102",
            "blockNumber": "0x10",
            "logIndex": "0x2",
            "removed": false
        }"#;
        let log: RpcLog = serde_json::from_str(raw).unwrap();
        assert_eq!(log.topics.len(), 1);
        assert_eq!(log.data.len(), 2);
        assert_eq!(parse_quantity(&log.block_number).unwrap(), 16);
    }

    #[tokio::test]
    async fn client_keeps_configured_url() {
        let config = RpcConfig::default();
        let client = LightRpcClient::new(&config);
        assert_eq!(client.url(), config.url);
    }
}

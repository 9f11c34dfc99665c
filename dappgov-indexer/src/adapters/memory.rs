//! In-memory chain used for development and tests
//!
//! Holds logs and canned `eth_call` results in memory and answers
//! [`ChainReader`] queries deterministically. Failures can be injected per
//! call or per block to exercise the degraded and fatal paths.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use crate::core::{BlockWindow, ChainReader, IndexerError, IndexerResult, LogFilter, NetworkError, RawLog};

/// Seconds between blocks when no explicit timestamp was set
const BLOCK_TIME_SECS: u64 = 12;
const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

#[derive(Debug)]
pub struct MemoryChain {
    chain_id: u64,
    head: u64,
    timestamps: BTreeMap<u64, u64>,
    logs: Vec<(Address, RawLog)>,
    calls: HashMap<(Address, Bytes), Bytes>,
    failing_calls: HashSet<(Address, Bytes)>,
    failing_blocks: HashSet<u64>,
    log_queries: Mutex<Vec<BlockWindow>>,
}

impl MemoryChain {
    pub fn new(chain_id: u64, head: u64) -> Self {
        Self {
            chain_id,
            head,
            timestamps: BTreeMap::new(),
            logs: Vec::new(),
            calls: HashMap::new(),
            failing_calls: HashSet::new(),
            failing_blocks: HashSet::new(),
            log_queries: Mutex::new(Vec::new()),
        }
    }

    pub fn set_block_timestamp(&mut self, block_number: u64, timestamp: u64) {
        self.timestamps.insert(block_number, timestamp);
    }

    /// Append a raw log; logs are kept in chain order
    pub fn push_log(&mut self, address: Address, log: RawLog) {
        self.logs.push((address, log));
        self.logs.sort_by_key(|(_, log)| log.position());
    }

    /// Encode and append a typed event
    pub fn emit<E: SolEvent>(&mut self, address: Address, event: &E, block_number: u64, log_index: u64) {
        let encoded = event.encode_log_data();
        self.push_log(
            address,
            RawLog {
                topics: encoded.topics().to_vec(),
                data: encoded.data.clone(),
                block_number,
                log_index,
            },
        );
    }

    /// Canned return data for an exact `eth_call`
    pub fn set_call_raw(&mut self, to: Address, data: Bytes, returns: Bytes) {
        self.calls.insert((to, data), returns);
    }

    /// Canned single-word return for a typed call
    pub fn set_call<T: SolCall>(&mut self, to: Address, call: &T, word: U256) {
        let returns = Bytes::copy_from_slice(&word.to_be_bytes::<32>());
        self.set_call_raw(to, call.abi_encode().into(), returns);
    }

    pub fn set_bool_call<T: SolCall>(&mut self, to: Address, call: &T, value: bool) {
        self.set_call(to, call, U256::from(u8::from(value)));
    }

    /// Make the given call revert
    pub fn fail_call<T: SolCall>(&mut self, to: Address, call: &T) {
        self.failing_calls.insert((to, call.abi_encode().into()));
    }

    /// Make every log query whose window covers `block_number` fail
    pub fn fail_logs_at(&mut self, block_number: u64) {
        self.failing_blocks.insert(block_number);
    }

    /// Windows requested so far
    pub fn log_queries(&self) -> Vec<BlockWindow> {
        self.log_queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    /// Every stored log matching `filter`, ignoring windowing
    pub fn all_logs(&self, filter: &LogFilter) -> Vec<RawLog> {
        self.logs
            .iter()
            .filter(|(address, log)| filter.matches(address, log))
            .map(|(_, log)| log.clone())
            .collect()
    }
}

#[async_trait]
impl ChainReader for MemoryChain {
    async fn chain_id(&self) -> IndexerResult<u64> {
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> IndexerResult<u64> {
        Ok(self.head)
    }

    async fn block_timestamp(&self, block_number: u64) -> IndexerResult<u64> {
        if block_number > self.head {
            return Err(NetworkError::InvalidResponse(format!("block {block_number} not found")).into());
        }
        Ok(self
            .timestamps
            .get(&block_number)
            .copied()
            .unwrap_or(GENESIS_TIMESTAMP + block_number * BLOCK_TIME_SECS))
    }

    async fn get_logs(&self, filter: &LogFilter) -> IndexerResult<Vec<RawLog>> {
        if let Ok(mut queries) = self.log_queries.lock() {
            queries.push(BlockWindow { from: filter.from_block, to: filter.to_block });
        }
        if self
            .failing_blocks
            .iter()
            .any(|b| (filter.from_block..=filter.to_block).contains(b))
        {
            return Err(NetworkError::Rpc {
                code: -32005,
                message: "query returned more than 10000 results".to_string(),
            }
            .into());
        }
        Ok(self.all_logs(filter))
    }

    async fn call(&self, to: Address, data: Bytes, _block: Option<u64>) -> IndexerResult<Bytes> {
        let key = (to, data);
        if self.failing_calls.contains(&key) {
            return Err(NetworkError::Rpc {
                code: 3,
                message: "execution reverted".to_string(),
            }
            .into());
        }
        self.calls.get(&key).cloned().ok_or_else(|| IndexerError::ContractRead {
            method: "eth_call",
            reason: format!("no contract response configured at {to}"),
        })
    }
}


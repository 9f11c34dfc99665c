//! Core chain-facing types

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a log within the chain; the total order used for every projection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventPosition {
    pub block_number: u64,
    pub log_index: u64,
}

impl EventPosition {
    pub fn new(block_number: u64, log_index: u64) -> Self {
        Self { block_number, log_index }
    }
}

impl fmt::Display for EventPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block_number, self.log_index)
    }
}

/// Raw event log as returned by `eth_getLogs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub log_index: u64,
}

impl RawLog {
    pub fn position(&self) -> EventPosition {
        EventPosition::new(self.block_number, self.log_index)
    }

    pub fn topic0(&self) -> Option<&B256> {
        self.topics.first()
    }
}

/// Inclusive block range for a single log query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    pub from: u64,
    pub to: u64,
}

impl BlockWindow {
    pub fn width(&self) -> u64 {
        self.to.saturating_sub(self.from).saturating_add(1)
    }
}

/// Log query filter. `topics[i] == None` matches any value at that position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<Option<B256>>,
    pub from_block: u64,
    pub to_block: u64,
}

impl LogFilter {
    /// Whether `log` emitted by `address` satisfies this filter
    pub fn matches(&self, address: &Address, log: &RawLog) -> bool {
        if address != &self.address {
            return false;
        }
        if log.block_number < self.from_block || log.block_number > self.to_block {
            return false;
        }
        self.topics.iter().enumerate().all(|(i, wanted)| match wanted {
            Some(topic) => log.topics.get(i) == Some(topic),
            None => true,
        })
    }
}

/// Common "now" reference for one enrichment batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainHead {
    pub block_number: u64,
    pub timestamp: u64,
}

/// Left-pad an address into an indexed topic word
pub fn address_topic(address: Address) -> B256 {
    address.into_word()
}

//! Dapp governance indexer library
//!
//! Reconstructs governor proposals, per-account voting runtime and the
//! latest state of a versioned dapp registry from historical EVM logs plus
//! authoritative contract reads. Every refresh is a full recomputation.

pub mod adapters;
pub mod config;
pub mod content;
pub mod contracts;
pub mod core;
pub mod models;
pub mod processors;
pub mod rpc_client;
pub mod services;
pub mod transaction_builder;

// Re-export commonly used types
pub use crate::config::{IndexerConfig, NetworkProfile};
pub use crate::core::{ChainReader, IndexerError, IndexerResult};
pub use models::*;
pub use rpc_client::LightRpcClient;
pub use services::{GovernanceService, GovernanceSnapshot, RefreshCoordinator, RefreshStatus};

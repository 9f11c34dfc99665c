//! ABI bindings for the governor and dapp registry contracts

pub mod governor;
pub mod registry;

use alloy_primitives::U256;

use crate::core::{IndexerError, IndexerResult};

/// Narrow an on-chain uint256 block number or timestamp into `u64`
pub fn to_u64(value: U256, field: &str) -> IndexerResult<u64> {
    if value > U256::from(u64::MAX) {
        return Err(IndexerError::Decode(format!("{field} does not fit in u64: {value}")));
    }
    Ok(value.as_limbs()[0])
}

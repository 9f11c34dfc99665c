//! Core abstractions and types
//!
//! Foundational types, ports and error definitions shared by the processors.
//! Nothing in here depends on a specific RPC transport.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{IndexerError, IndexerResult, NetworkError};
pub use traits::{ChainReader, ContentGateway};
pub use types::{address_topic, BlockWindow, ChainHead, EventPosition, LogFilter, RawLog};

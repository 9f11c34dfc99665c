//! Chain reader adapters other than the JSON-RPC client

pub mod memory;

pub use memory::MemoryChain;

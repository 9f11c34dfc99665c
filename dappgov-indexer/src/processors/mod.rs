//! Log retrieval, decoding and projection

pub mod bundle;
pub mod dapp_registry;
pub mod log_fetcher;
pub mod proposals;
pub mod runtime;

pub use bundle::{decode_bundle_call, extract_bundle_reference};
pub use dapp_registry::{decode_registry_event, fold_registry_events, DappRegistryProcessor, RegistryEvent, RegistryEventKind};
pub use log_fetcher::{block_windows, LogFetcher};
pub use proposals::{compare_proposals, decode_proposal_created, ProposalProcessor};
pub use runtime::{decode_vote_event, latest_votes, RuntimeProcessor, RuntimeSnapshot};

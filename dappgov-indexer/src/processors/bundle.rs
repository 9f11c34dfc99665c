//! Recover the content bundle a proposal governs from its calldata

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;

use crate::contracts::registry::{publishDappCall, upgradeDappCall};
use crate::models::bundle::{decode_content_id, BundleAction, BundleReference};
use crate::models::proposal::ProposalRecord;

/// Decode a single call payload against the registry's governed functions
pub fn decode_bundle_call(calldata: &Bytes) -> Option<BundleReference> {
    if let Ok(call) = publishDappCall::abi_decode(calldata, true) {
        return Some(BundleReference {
            action: BundleAction::Publish,
            root_content_id: decode_content_id(&call.rootCid),
            dapp_id: None,
        });
    }
    if let Ok(call) = upgradeDappCall::abi_decode(calldata, true) {
        return Some(BundleReference {
            action: BundleAction::Upgrade,
            root_content_id: decode_content_id(&call.rootCid),
            dapp_id: Some(call.dappId),
        });
    }
    None
}

/// First publish/upgrade call in the proposal addressed to `expected_registry`
/// (any target when `None`). Proposals unrelated to the registry yield `None`.
pub fn extract_bundle_reference(
    proposal: &ProposalRecord,
    expected_registry: Option<Address>,
) -> Option<BundleReference> {
    proposal
        .targets
        .iter()
        .zip(proposal.calldatas.iter())
        .filter(|(target, _)| expected_registry.map_or(true, |registry| **target == registry))
        .find_map(|(_, calldata)| decode_bundle_call(calldata))
}

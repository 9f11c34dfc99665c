//! Shared fixtures for the integration tests

#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use dappgov_indexer::adapters::MemoryChain;
use dappgov_indexer::config::{IndexerSettings, NetworkProfile};
use dappgov_indexer::contracts::governor::{
    hasVotedCall, proposalDeadlineCall, proposalEtaCall, proposalSnapshotCall, stateCall, ProposalCreated,
    VoteCast, VoteCastWithParams,
};
use dappgov_indexer::contracts::registry::{
    publishDappCall, upgradeDappCall, DappMetadata, DappPaused, DappPublished, DappUpgraded,
};

pub const CHAIN_ID: u64 = 31_337;

pub fn governor() -> Address {
    Address::repeat_byte(0x60)
}

pub fn registry() -> Address {
    Address::repeat_byte(0x70)
}

pub fn voter() -> Address {
    Address::repeat_byte(0x0a)
}

pub fn proposer() -> Address {
    Address::repeat_byte(0x0b)
}

pub fn id(value: u64) -> U256 {
    U256::from(value)
}

pub fn profile() -> NetworkProfile {
    NetworkProfile {
        name: "localhost".to_string(),
        chain_id: CHAIN_ID,
        rpc_url: None,
        governor: governor(),
        registry: registry(),
        start_block: 0,
    }
}

pub fn settings(max_block_window: u64) -> IndexerSettings {
    IndexerSettings {
        max_block_window,
        new_proposal_attempts: 3,
        new_proposal_delay_ms: 1,
    }
}

pub fn publish_calldata(cid: &str) -> Bytes {
    publishDappCall {
        rootCid: Bytes::copy_from_slice(cid.as_bytes()),
        name: "Notes".to_string(),
        version: "1.0.0".to_string(),
        description: "notes app".to_string(),
    }
    .abi_encode()
    .into()
}

pub fn upgrade_calldata(dapp_id: u64, cid: &str) -> Bytes {
    upgradeDappCall {
        dappId: U256::from(dapp_id),
        rootCid: Bytes::copy_from_slice(cid.as_bytes()),
        name: "Notes".to_string(),
        version: "2.0.0".to_string(),
        description: "notes app".to_string(),
    }
    .abi_encode()
    .into()
}

pub fn proposal_event(
    proposal_id: u64,
    vote_start: u64,
    vote_end: u64,
    actions: Vec<(Address, Bytes)>,
    description: &str,
) -> ProposalCreated {
    let (targets, calldatas): (Vec<Address>, Vec<Bytes>) = actions.into_iter().unzip();
    ProposalCreated {
        proposalId: U256::from(proposal_id),
        proposer: proposer(),
        values: vec![U256::ZERO; targets.len()],
        signatures: vec![String::new(); targets.len()],
        targets,
        calldatas,
        voteStart: U256::from(vote_start),
        voteEnd: U256::from(vote_end),
        description: description.to_string(),
    }
}

/// Emit a creation event with a single no-op action and a state code
pub fn add_proposal(chain: &mut MemoryChain, proposal_id: u64, block: u64, log_index: u64, state: u8) {
    let event = proposal_event(
        proposal_id,
        block + 1,
        block + 100,
        vec![(Address::repeat_byte(0x99), Bytes::new())],
        &format!("Proposal #{proposal_id}"),
    );
    chain.emit(governor(), &event, block, log_index);
    set_state(chain, proposal_id, state);
}

pub fn set_state(chain: &mut MemoryChain, proposal_id: u64, state: u8) {
    chain.set_call(governor(), &stateCall { proposalId: id(proposal_id) }, U256::from(state));
}

/// Canned runtime reads for one proposal
pub fn set_runtime(
    chain: &mut MemoryChain,
    proposal_id: u64,
    snapshot: u64,
    deadline: u64,
    eta: u64,
    has_voted: Option<bool>,
) {
    let pid = id(proposal_id);
    chain.set_call(governor(), &proposalSnapshotCall { proposalId: pid }, U256::from(snapshot));
    chain.set_call(governor(), &proposalDeadlineCall { proposalId: pid }, U256::from(deadline));
    chain.set_call(governor(), &proposalEtaCall { proposalId: pid }, U256::from(eta));
    if let Some(voted) = has_voted {
        chain.set_bool_call(governor(), &hasVotedCall { proposalId: pid, account: voter() }, voted);
    }
}

pub fn vote(proposal_id: u64, support: u8, weight: u64) -> VoteCast {
    VoteCast {
        voter: voter(),
        proposalId: id(proposal_id),
        support,
        weight: U256::from(weight),
        reason: String::new(),
    }
}

pub fn vote_with_params(proposal_id: u64, support: u8, weight: u64) -> VoteCastWithParams {
    VoteCastWithParams {
        voter: voter(),
        proposalId: id(proposal_id),
        support,
        weight: U256::from(weight),
        reason: "params".to_string(),
        params: Bytes::from(vec![1u8, 2, 3]),
    }
}

pub fn published(dapp_id: u64, version_id: u64, cid: &str) -> DappPublished {
    DappPublished {
        dappId: id(dapp_id),
        versionId: id(version_id),
        rootCid: Bytes::copy_from_slice(cid.as_bytes()),
    }
}

pub fn upgraded(dapp_id: u64, version_id: u64, cid: &str) -> DappUpgraded {
    DappUpgraded {
        dappId: id(dapp_id),
        versionId: id(version_id),
        rootCid: Bytes::copy_from_slice(cid.as_bytes()),
    }
}

pub fn metadata(dapp_id: u64, version_id: u64, name: &str, description: &str) -> DappMetadata {
    DappMetadata {
        dappId: id(dapp_id),
        versionId: id(version_id),
        name: name.to_string(),
        version: "1.0.0".to_string(),
        description: description.to_string(),
    }
}

pub fn paused(dapp_id: u64, version_id: u64) -> DappPaused {
    DappPaused {
        dappId: id(dapp_id),
        versionId: id(version_id),
    }
}

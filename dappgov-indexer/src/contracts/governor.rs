//! Governor bindings and authoritative reads

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use tracing::trace;

use crate::core::{ChainReader, IndexerError, IndexerResult};
use crate::models::proposal::ProposalState;

use super::to_u64;

sol! {
    event ProposalCreated(
        uint256 proposalId,
        address proposer,
        address[] targets,
        uint256[] values,
        string[] signatures,
        bytes[] calldatas,
        uint256 voteStart,
        uint256 voteEnd,
        string description
    );

    event VoteCast(address indexed voter, uint256 proposalId, uint8 support, uint256 weight, string reason);

    event VoteCastWithParams(
        address indexed voter,
        uint256 proposalId,
        uint8 support,
        uint256 weight,
        string reason,
        bytes params
    );

    function state(uint256 proposalId) external view returns (uint8);
    function proposalSnapshot(uint256 proposalId) external view returns (uint256);
    function proposalDeadline(uint256 proposalId) external view returns (uint256);
    function proposalEta(uint256 proposalId) external view returns (uint256);
    function hasVoted(uint256 proposalId, address account) external view returns (bool);
    function proposalThreshold() external view returns (uint256);
    function getVotes(address account, uint256 timepoint) external view returns (uint256);

    function propose(address[] targets, uint256[] values, bytes[] calldatas, string description) external returns (uint256);
    function castVote(uint256 proposalId, uint8 support) external returns (uint256);
    function castVoteWithReason(uint256 proposalId, uint8 support, string reason) external returns (uint256);
    function queue(address[] targets, uint256[] values, bytes[] calldatas, bytes32 descriptionHash) external returns (uint256);
    function execute(address[] targets, uint256[] values, bytes[] calldatas, bytes32 descriptionHash) external payable returns (uint256);
}

/// Typed read access to a governor deployment
pub struct GovernorContract<'a, C: ChainReader + ?Sized> {
    chain: &'a C,
    address: Address,
}

impl<'a, C: ChainReader + ?Sized> GovernorContract<'a, C> {
    pub fn new(chain: &'a C, address: Address) -> Self {
        Self { chain, address }
    }

    async fn read<T>(&self, call: T, block: Option<u64>) -> IndexerResult<T::Return>
    where
        T: SolCall + Send,
    {
        let data = call.abi_encode();
        trace!(method = T::SIGNATURE, governor = %self.address, "governor read");
        let raw = self.chain.call(self.address, data.into(), block).await?;
        T::abi_decode_returns(&raw, true).map_err(|e| IndexerError::ContractRead {
            method: T::SIGNATURE,
            reason: e.to_string(),
        })
    }

    /// Lifecycle state; unknown codes pass through as [`ProposalState::Unrecognized`]
    pub async fn state(&self, proposal_id: U256) -> IndexerResult<ProposalState> {
        let code = self.read(stateCall { proposalId: proposal_id }, None).await?._0;
        Ok(ProposalState::from_code(code))
    }

    pub async fn proposal_snapshot(&self, proposal_id: U256) -> IndexerResult<u64> {
        let value = self.read(proposalSnapshotCall { proposalId: proposal_id }, None).await?._0;
        to_u64(value, "proposalSnapshot")
    }

    pub async fn proposal_deadline(&self, proposal_id: U256) -> IndexerResult<u64> {
        let value = self.read(proposalDeadlineCall { proposalId: proposal_id }, None).await?._0;
        to_u64(value, "proposalDeadline")
    }

    /// Execution eta in seconds; zero (not queued) maps to `None`
    pub async fn proposal_eta(&self, proposal_id: U256) -> IndexerResult<Option<u64>> {
        let value = self.read(proposalEtaCall { proposalId: proposal_id }, None).await?._0;
        let eta = to_u64(value, "proposalEta")?;
        Ok((eta > 0).then_some(eta))
    }

    pub async fn has_voted(&self, proposal_id: U256, account: Address) -> IndexerResult<bool> {
        let voted = self
            .read(hasVotedCall { proposalId: proposal_id, account }, None)
            .await?
            ._0;
        Ok(voted)
    }

    pub async fn proposal_threshold(&self) -> IndexerResult<U256> {
        Ok(self.read(proposalThresholdCall {}, None).await?._0)
    }

    /// Voting power of `account` at a past `timepoint`
    pub async fn get_votes(&self, account: Address, timepoint: u64) -> IndexerResult<U256> {
        let call = getVotesCall { account, timepoint: U256::from(timepoint) };
        Ok(self.read(call, None).await?._0)
    }
}

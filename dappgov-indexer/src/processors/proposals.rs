//! Proposal creation-event decoder and projector

use alloy_primitives::Address;
use alloy_sol_types::SolEvent;
use futures::future::join_all;
use std::cmp::Ordering;
use tracing::{debug, info, warn};

use crate::contracts::governor::{GovernorContract, ProposalCreated};
use crate::contracts::to_u64;
use crate::core::{ChainReader, IndexerError, IndexerResult, RawLog};
use crate::models::proposal::{ProposalRecord, ProposalState};

use super::log_fetcher::LogFetcher;

/// Decode one `ProposalCreated` log. The returned record carries
/// `ProposalState::Pending` until the authoritative state is read.
pub fn decode_proposal_created(log: &RawLog) -> IndexerResult<ProposalRecord> {
    let event = ProposalCreated::decode_raw_log(log.topics.iter().copied(), &log.data, true)?;

    let len = event.targets.len();
    if event.values.len() != len || event.calldatas.len() != len {
        return Err(IndexerError::Decode(format!(
            "proposal {} has misaligned actions: {} targets, {} values, {} calldatas",
            event.proposalId,
            len,
            event.values.len(),
            event.calldatas.len()
        )));
    }

    Ok(ProposalRecord {
        proposal_id: event.proposalId,
        proposer: event.proposer,
        description: event.description,
        targets: event.targets,
        values: event.values,
        calldatas: event.calldatas,
        vote_start: to_u64(event.voteStart, "voteStart")?,
        vote_end: to_u64(event.voteEnd, "voteEnd")?,
        state: ProposalState::Pending,
        created_at: log.position(),
        state_unavailable: false,
    })
}

/// "Most recent first": creation position descending, then vote start, then id
pub fn compare_proposals(a: &ProposalRecord, b: &ProposalRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.vote_start.cmp(&a.vote_start))
        .then_with(|| b.proposal_id.cmp(&a.proposal_id))
}

/// Lists proposals of a governor with their live lifecycle state
pub struct ProposalProcessor<C: ChainReader + ?Sized> {
    fetcher: LogFetcher<C>,
}

impl<C: ChainReader + ?Sized> ProposalProcessor<C> {
    pub fn new(fetcher: LogFetcher<C>) -> Self {
        Self { fetcher }
    }

    /// Decode every creation log from `from_block`, read each state and sort.
    ///
    /// Logs that fail to decode are skipped. A proposal whose state read
    /// fails stays listed with its creation-time state and
    /// `state_unavailable` set.
    pub async fn list_proposals(
        &self,
        governor: Address,
        from_block: u64,
    ) -> IndexerResult<Vec<ProposalRecord>> {
        let logs = self
            .fetcher
            .fetch_logs(governor, ProposalCreated::SIGNATURE_HASH, &[], from_block)
            .await?;

        let decoded: Vec<ProposalRecord> = logs
            .iter()
            .filter_map(|log| match decode_proposal_created(log) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(position = %log.position(), error = %e, "dropping undecodable proposal log");
                    None
                }
            })
            .collect();

        let contract = GovernorContract::new(self.fetcher.chain().as_ref(), governor);
        let states = join_all(decoded.iter().map(|p| contract.state(p.proposal_id))).await;

        let mut proposals: Vec<ProposalRecord> = decoded
            .iter()
            .zip(states)
            .map(|(proposal, state)| match state {
                Ok(state) => proposal.with_state(state),
                Err(e) => {
                    warn!(
                        proposal_id = %proposal.proposal_id,
                        error = %e,
                        "state read failed, keeping creation-time state"
                    );
                    proposal.without_live_state()
                }
            })
            .collect();
        proposals.sort_by(compare_proposals);

        info!(
            %governor,
            logs = logs.len(),
            proposals = proposals.len(),
            without_state = proposals.iter().filter(|p| p.state_unavailable).count(),
            "listed proposals"
        );
        Ok(proposals)
    }
}

//! Proposal runtime enrichment
//!
//! Combines authoritative governor reads with the latest vote the active
//! account cast, producing the facts the UI gates actions and countdowns on.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::contracts::governor::{GovernorContract, VoteCast, VoteCastWithParams};
use crate::core::{address_topic, ChainHead, ChainReader, IndexerResult, RawLog};
use crate::models::proposal::{ProposalRecord, ProposalRuntimeState, VoteDirection, VoteEvent};

use super::log_fetcher::LogFetcher;

/// Runtime facts for one batch of proposals, all relative to `chain_head`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSnapshot {
    pub chain_head: ChainHead,
    pub by_proposal_id: BTreeMap<U256, ProposalRuntimeState>,
}

impl RuntimeSnapshot {
    pub fn get(&self, proposal_id: &U256) -> Option<&ProposalRuntimeState> {
        self.by_proposal_id.get(proposal_id)
    }

    pub fn degraded_count(&self) -> usize {
        self.by_proposal_id.values().filter(|r| r.degraded).count()
    }
}

/// Decode either vote event shape
pub fn decode_vote_event(log: &RawLog) -> IndexerResult<VoteEvent> {
    let topics = log.topics.iter().copied();
    if log.topic0() == Some(&VoteCastWithParams::SIGNATURE_HASH) {
        let event = VoteCastWithParams::decode_raw_log(topics, &log.data, true)?;
        return Ok(VoteEvent {
            proposal_id: event.proposalId,
            voter: event.voter,
            direction: VoteDirection::from_support(event.support),
            weight: event.weight,
            position: log.position(),
        });
    }
    let event = VoteCast::decode_raw_log(topics, &log.data, true)?;
    Ok(VoteEvent {
        proposal_id: event.proposalId,
        voter: event.voter,
        direction: VoteDirection::from_support(event.support),
        weight: event.weight,
        position: log.position(),
    })
}

/// Effective vote per proposal: the event with the greatest chain position wins
pub fn latest_votes(events: impl IntoIterator<Item = VoteEvent>) -> HashMap<U256, VoteEvent> {
    let mut latest: HashMap<U256, VoteEvent> = HashMap::new();
    for event in events {
        match latest.get(&event.proposal_id) {
            Some(current) if current.position >= event.position => {}
            _ => {
                latest.insert(event.proposal_id, event);
            }
        }
    }
    latest
}

/// Builds [`RuntimeSnapshot`]s for a governor
pub struct RuntimeProcessor<C: ChainReader + ?Sized> {
    fetcher: LogFetcher<C>,
}

impl<C: ChainReader + ?Sized> RuntimeProcessor<C> {
    pub fn new(fetcher: LogFetcher<C>) -> Self {
        Self { fetcher }
    }

    /// Head block and its timestamp, read once per batch
    pub async fn chain_head(&self) -> IndexerResult<ChainHead> {
        let chain = self.fetcher.chain();
        let block_number = chain.block_number().await?;
        let timestamp = chain.block_timestamp(block_number).await?;
        Ok(ChainHead { block_number, timestamp })
    }

    /// Vote events cast by `account` on `governor`, both event shapes
    pub async fn account_votes(
        &self,
        governor: Address,
        account: Address,
        from_block: u64,
    ) -> IndexerResult<HashMap<U256, VoteEvent>> {
        let voter = [Some(address_topic(account))];
        let (plain, with_params) = futures::try_join!(
            self.fetcher
                .fetch_logs(governor, VoteCast::SIGNATURE_HASH, &voter, from_block),
            self.fetcher
                .fetch_logs(governor, VoteCastWithParams::SIGNATURE_HASH, &voter, from_block),
        )?;

        let events = plain
            .iter()
            .chain(with_params.iter())
            .filter_map(|log| match decode_vote_event(log) {
                Ok(event) if event.voter == account => Some(event),
                Ok(_) => None,
                Err(e) => {
                    debug!(position = %log.position(), error = %e, "dropping undecodable vote log");
                    None
                }
            });
        Ok(latest_votes(events))
    }

    /// Runtime view for every proposal in `proposals`.
    ///
    /// Head and vote-log failures fail the batch; a failed read for a single
    /// proposal degrades only that proposal.
    pub async fn enrich(
        &self,
        governor: Address,
        proposals: &[ProposalRecord],
        account: Option<Address>,
        from_block: u64,
    ) -> IndexerResult<RuntimeSnapshot> {
        let chain_head = self.chain_head().await?;
        let votes = match account {
            Some(account) => self.account_votes(governor, account, from_block).await?,
            None => HashMap::new(),
        };

        let contract = GovernorContract::new(self.fetcher.chain().as_ref(), governor);
        let contract = &contract;
        let votes = &votes;
        let runtimes = join_all(proposals.iter().map(|proposal| async move {
            match read_runtime(contract, proposal, account, votes).await {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(
                        proposal_id = %proposal.proposal_id,
                        error = %e,
                        "runtime read failed, using creation-time fields"
                    );
                    ProposalRuntimeState::degraded(proposal)
                }
            }
        }))
        .await;

        let by_proposal_id: BTreeMap<U256, ProposalRuntimeState> = runtimes
            .into_iter()
            .map(|runtime| (runtime.proposal_id, runtime))
            .collect();
        let snapshot = RuntimeSnapshot { chain_head, by_proposal_id };

        info!(
            %governor,
            head = chain_head.block_number,
            proposals = proposals.len(),
            degraded = snapshot.degraded_count(),
            "enriched proposals"
        );
        Ok(snapshot)
    }
}

async fn read_runtime<C: ChainReader + ?Sized>(
    contract: &GovernorContract<'_, C>,
    proposal: &ProposalRecord,
    account: Option<Address>,
    votes: &HashMap<U256, VoteEvent>,
) -> IndexerResult<ProposalRuntimeState> {
    let id = proposal.proposal_id;
    let has_voted = async {
        match account {
            Some(account) => contract.has_voted(id, account).await,
            None => Ok(false),
        }
    };
    let (state, snapshot_block, deadline_block, execution_eta_seconds, has_voted) = futures::try_join!(
        contract.state(id),
        contract.proposal_snapshot(id),
        contract.proposal_deadline(id),
        contract.proposal_eta(id),
        has_voted,
    )?;

    // The flag decides whether a vote exists; the scanned event only says what it was.
    let local_vote = if has_voted { votes.get(&id) } else { None };

    Ok(ProposalRuntimeState {
        proposal_id: id,
        state,
        snapshot_block,
        deadline_block,
        execution_eta_seconds,
        has_voted,
        vote_direction: local_vote.map_or(VoteDirection::None, |v| v.direction),
        vote_weight: local_vote.map(|v| v.weight),
        degraded: false,
    })
}

//! Snapshot assembly and caller-level orchestration

mod refresh;

pub use refresh::{RefreshCoordinator, RefreshKey, SharedRefreshResult};

use alloy_primitives::{Address, U256};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{IndexerSettings, NetworkProfile};
use crate::contracts::governor::GovernorContract;
use crate::core::{ChainHead, ChainReader, IndexerError, IndexerResult};
use crate::models::bundle::BundleReference;
use crate::models::dapp::DappRow;
use crate::models::proposal::{ProposalActions, ProposalRecord, VotingPower};
use crate::processors::{
    extract_bundle_reference, DappRegistryProcessor, LogFetcher, ProposalProcessor, RuntimeProcessor,
    RuntimeSnapshot,
};

/// How complete a refresh was
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum RefreshStatus {
    Full,
    Partial { degraded_proposals: usize },
}

/// Everything the presentation layer needs, as of one chain head
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceSnapshot {
    pub network: String,
    pub account: Option<Address>,
    pub proposals: Vec<ProposalRecord>,
    pub runtime: RuntimeSnapshot,
    pub actions: BTreeMap<U256, ProposalActions>,
    pub bundles: BTreeMap<U256, BundleReference>,
    pub dapps: Vec<DappRow>,
}

impl GovernanceSnapshot {
    pub fn chain_head(&self) -> ChainHead {
        self.runtime.chain_head
    }

    /// Proposals missing their live state or any runtime read
    pub fn degraded_proposals(&self) -> usize {
        self.proposals
            .iter()
            .filter(|p| {
                p.state_unavailable
                    || self.runtime.get(&p.proposal_id).is_some_and(|r| r.degraded)
            })
            .count()
    }

    pub fn status(&self) -> RefreshStatus {
        match self.degraded_proposals() {
            0 => RefreshStatus::Full,
            degraded_proposals => RefreshStatus::Partial { degraded_proposals },
        }
    }

    pub fn proposal(&self, proposal_id: U256) -> Option<&ProposalRecord> {
        self.proposals.iter().find(|p| p.proposal_id == proposal_id)
    }
}

/// Outcome of waiting for a freshly submitted proposal to be indexed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalAppearance {
    Found(Box<ProposalRecord>),
    /// The write succeeded but the listing has not caught up yet
    IndexingLag { attempts: u32 },
}

/// Governance reads for one resolved network
pub struct GovernanceService<C: ChainReader + ?Sized> {
    chain: Arc<C>,
    network: NetworkProfile,
    settings: IndexerSettings,
    proposals: ProposalProcessor<C>,
    runtime: RuntimeProcessor<C>,
    registry: DappRegistryProcessor<C>,
}

impl<C: ChainReader + ?Sized> GovernanceService<C> {
    pub fn new(chain: Arc<C>, network: NetworkProfile, settings: IndexerSettings) -> Self {
        let fetcher = LogFetcher::new(chain.clone(), settings.max_block_window);
        Self {
            chain,
            network,
            settings,
            proposals: ProposalProcessor::new(fetcher.clone()),
            runtime: RuntimeProcessor::new(fetcher.clone()),
            registry: DappRegistryProcessor::new(fetcher),
        }
    }

    /// Like [`GovernanceService::new`] but first checks the endpoint serves
    /// the configured chain
    pub async fn connect(chain: Arc<C>, network: NetworkProfile, settings: IndexerSettings) -> IndexerResult<Self> {
        let chain_id = chain.chain_id().await?;
        if chain_id != network.chain_id {
            return Err(IndexerError::missing(format!(
                "endpoint serves chain {chain_id}, network {} expects {}",
                network.name, network.chain_id
            )));
        }
        Ok(Self::new(chain, network, settings))
    }

    pub fn network(&self) -> &NetworkProfile {
        &self.network
    }

    pub async fn list_proposals(&self) -> IndexerResult<Vec<ProposalRecord>> {
        self.proposals
            .list_proposals(self.network.governor, self.network.start_block)
            .await
    }

    pub async fn list_dapps(&self) -> IndexerResult<Vec<DappRow>> {
        self.registry
            .list_dapps(self.network.registry, self.network.start_block)
            .await
    }

    pub async fn enrich(
        &self,
        proposals: &[ProposalRecord],
        account: Option<Address>,
    ) -> IndexerResult<RuntimeSnapshot> {
        self.runtime
            .enrich(self.network.governor, proposals, account, self.network.start_block)
            .await
    }

    /// Bundle reference for one proposal, restricted to this network's registry
    pub fn bundle_reference(&self, proposal: &ProposalRecord) -> Option<BundleReference> {
        extract_bundle_reference(proposal, Some(self.network.registry))
    }

    /// Full recomputation of the governance view for `account`
    pub async fn refresh(&self, account: Option<Address>) -> IndexerResult<GovernanceSnapshot> {
        let (proposals, dapps) = futures::try_join!(self.list_proposals(), self.list_dapps())?;
        let runtime = self.enrich(&proposals, account).await?;

        let actions = runtime
            .by_proposal_id
            .iter()
            .map(|(id, state)| (*id, state.actions(&runtime.chain_head)))
            .collect();
        let bundles = proposals
            .iter()
            .filter_map(|p| self.bundle_reference(p).map(|b| (p.proposal_id, b)))
            .collect();

        let snapshot = GovernanceSnapshot {
            network: self.network.name.clone(),
            account,
            proposals,
            runtime,
            actions,
            bundles,
            dapps,
        };
        match snapshot.status() {
            RefreshStatus::Full => info!(
                network = %snapshot.network,
                head = snapshot.chain_head().block_number,
                proposals = snapshot.proposals.len(),
                dapps = snapshot.dapps.len(),
                "refresh complete"
            ),
            RefreshStatus::Partial { degraded_proposals } => warn!(
                network = %snapshot.network,
                head = snapshot.chain_head().block_number,
                degraded_proposals,
                "refresh complete with degraded proposals"
            ),
        }
        Ok(snapshot)
    }

    /// Re-list until `proposal_id` shows up, tolerating RPC indexing lag
    pub async fn await_proposal(&self, proposal_id: U256) -> IndexerResult<ProposalAppearance> {
        let attempts = self.settings.new_proposal_attempts.max(1);
        let delay = Duration::from_millis(self.settings.new_proposal_delay_ms);
        for attempt in 1..=attempts {
            let proposals = self.list_proposals().await?;
            if let Some(found) = proposals.into_iter().find(|p| p.proposal_id == proposal_id) {
                info!(%proposal_id, attempt, "proposal indexed");
                return Ok(ProposalAppearance::Found(Box::new(found)));
            }
            if attempt < attempts {
                tokio::time::sleep(delay).await;
            }
        }
        warn!(%proposal_id, attempts, "proposal not visible yet, RPC indexing may be lagging");
        Ok(ProposalAppearance::IndexingLag { attempts })
    }

    /// Voting power and proposal threshold for `account`
    pub async fn eligibility(&self, account: Option<Address>) -> IndexerResult<VotingPower> {
        let account = account.ok_or_else(|| IndexerError::missing("no connected account"))?;
        let head = self.chain.block_number().await?;
        // getVotes only accepts past timepoints
        let timepoint = head.saturating_sub(1);
        let governor = GovernorContract::new(self.chain.as_ref(), self.network.governor);
        let (votes, proposal_threshold) =
            futures::try_join!(governor.get_votes(account, timepoint), governor.proposal_threshold())?;
        Ok(VotingPower {
            account,
            timepoint,
            votes,
            proposal_threshold,
        })
    }
}

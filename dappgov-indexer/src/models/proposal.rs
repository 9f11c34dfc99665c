//! Proposal data models

use alloy_primitives::{Address, Bytes, U256};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::core::{ChainHead, EventPosition};

/// Governor lifecycle state as reported by `state(proposalId)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalState {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
    /// Code outside the known enumeration, kept verbatim
    Unrecognized(u8),
}

impl ProposalState {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ProposalState::Pending,
            1 => ProposalState::Active,
            2 => ProposalState::Canceled,
            3 => ProposalState::Defeated,
            4 => ProposalState::Succeeded,
            5 => ProposalState::Queued,
            6 => ProposalState::Expired,
            7 => ProposalState::Executed,
            other => ProposalState::Unrecognized(other),
        }
    }

    /// Whether the proposal can still change state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalState::Canceled
                | ProposalState::Defeated
                | ProposalState::Expired
                | ProposalState::Executed
        )
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalState::Pending => write!(f, "Pending"),
            ProposalState::Active => write!(f, "Active"),
            ProposalState::Canceled => write!(f, "Canceled"),
            ProposalState::Defeated => write!(f, "Defeated"),
            ProposalState::Succeeded => write!(f, "Succeeded"),
            ProposalState::Queued => write!(f, "Queued"),
            ProposalState::Expired => write!(f, "Expired"),
            ProposalState::Executed => write!(f, "Executed"),
            ProposalState::Unrecognized(code) => write!(f, "{code}"),
        }
    }
}

impl Serialize for ProposalState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A proposal reconstructed from its creation event plus a live state read
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRecord {
    pub proposal_id: U256,
    pub proposer: Address,
    pub description: String,
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub calldatas: Vec<Bytes>,
    pub vote_start: u64,
    pub vote_end: u64,
    pub state: ProposalState,
    pub created_at: EventPosition,
    /// The live state read failed; `state` is the creation-time default
    pub state_unavailable: bool,
}

impl ProposalRecord {
    /// Same record with a refreshed state
    pub fn with_state(&self, state: ProposalState) -> Self {
        Self {
            state,
            state_unavailable: false,
            ..self.clone()
        }
    }

    /// Same record, flagged as missing its live state
    pub fn without_live_state(&self) -> Self {
        Self {
            state_unavailable: true,
            ..self.clone()
        }
    }

    /// First line of the description, used as a title by most governor frontends
    pub fn title(&self) -> &str {
        self.description
            .lines()
            .next()
            .map(|line| line.trim_start_matches('#').trim())
            .unwrap_or_default()
    }
}

/// Vote support as encoded by `castVote`: against=0, for=1, abstain=2
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Against,
    For,
    Abstain,
    None,
}

impl VoteDirection {
    pub fn from_support(support: u8) -> Self {
        match support {
            0 => VoteDirection::Against,
            1 => VoteDirection::For,
            2 => VoteDirection::Abstain,
            _ => VoteDirection::None,
        }
    }

    /// `support` argument for `castVote`; `None` has no encoding
    pub fn support(&self) -> Option<u8> {
        match self {
            VoteDirection::Against => Some(0),
            VoteDirection::For => Some(1),
            VoteDirection::Abstain => Some(2),
            VoteDirection::None => None,
        }
    }
}

/// Decoded `VoteCast` / `VoteCastWithParams`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteEvent {
    pub proposal_id: U256,
    pub voter: Address,
    pub direction: VoteDirection,
    pub weight: U256,
    pub position: EventPosition,
}

/// Per-proposal runtime facts for one account, recomputed on every refresh
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRuntimeState {
    pub proposal_id: U256,
    pub state: ProposalState,
    pub snapshot_block: u64,
    pub deadline_block: u64,
    pub execution_eta_seconds: Option<u64>,
    pub has_voted: bool,
    pub vote_direction: VoteDirection,
    pub vote_weight: Option<U256>,
    /// Built from creation-time fields because a live read failed
    pub degraded: bool,
}

impl ProposalRuntimeState {
    /// Fallback used when any authoritative read for the proposal fails
    pub fn degraded(proposal: &ProposalRecord) -> Self {
        Self {
            proposal_id: proposal.proposal_id,
            state: proposal.state,
            snapshot_block: proposal.vote_start,
            deadline_block: proposal.vote_end,
            execution_eta_seconds: None,
            has_voted: false,
            vote_direction: VoteDirection::None,
            vote_weight: None,
            degraded: true,
        }
    }

    pub fn actions(&self, head: &ChainHead) -> ProposalActions {
        ProposalActions {
            can_vote: self.state == ProposalState::Active && !self.has_voted,
            can_queue: self.state == ProposalState::Succeeded,
            can_execute: self.state == ProposalState::Queued
                && self
                    .execution_eta_seconds
                    .is_some_and(|eta| eta <= head.timestamp),
        }
    }

    pub fn blocks_until_snapshot(&self, head: &ChainHead) -> u64 {
        self.snapshot_block.saturating_sub(head.block_number)
    }

    pub fn blocks_until_deadline(&self, head: &ChainHead) -> u64 {
        self.deadline_block.saturating_sub(head.block_number)
    }

    /// Seconds left on the timelock, `None` when not queued
    pub fn seconds_until_executable(&self, head: &ChainHead) -> Option<u64> {
        self.execution_eta_seconds
            .map(|eta| eta.saturating_sub(head.timestamp))
    }
}

/// Which governor write actions the UI may offer
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProposalActions {
    pub can_vote: bool,
    pub can_queue: bool,
    pub can_execute: bool,
}

/// Proposal eligibility of an account
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VotingPower {
    pub account: Address,
    pub timepoint: u64,
    pub votes: U256,
    pub proposal_threshold: U256,
}

impl VotingPower {
    pub fn can_propose(&self) -> bool {
        self.votes >= self.proposal_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(state: ProposalState, eta: Option<u64>, has_voted: bool) -> ProposalRuntimeState {
        ProposalRuntimeState {
            proposal_id: U256::from(1u64),
            state,
            snapshot_block: 100,
            deadline_block: 200,
            execution_eta_seconds: eta,
            has_voted,
            vote_direction: VoteDirection::None,
            vote_weight: None,
            degraded: false,
        }
    }

    #[test]
    fn unknown_state_codes_render_raw() {
        assert_eq!(ProposalState::from_code(1).to_string(), "Active");
        assert_eq!(ProposalState::from_code(9).to_string(), "9");
        assert_eq!(
            serde_json::to_string(&ProposalState::from_code(12)).unwrap(),
            "\"12\""
        );
    }

    #[test]
    fn only_finished_states_are_terminal() {
        let terminal: Vec<u8> = (0u8..10)
            .filter(|code| ProposalState::from_code(*code).is_terminal())
            .collect();
        assert_eq!(terminal, vec![2, 3, 6, 7]);
    }

    #[test]
    fn vote_gating_requires_active_and_not_voted() {
        let head = ChainHead { block_number: 150, timestamp: 1_000 };
        assert!(runtime(ProposalState::Active, None, false).actions(&head).can_vote);
        assert!(!runtime(ProposalState::Active, None, true).actions(&head).can_vote);
        assert!(!runtime(ProposalState::Pending, None, false).actions(&head).can_vote);
    }

    #[test]
    fn execute_waits_for_eta() {
        let head = ChainHead { block_number: 300, timestamp: 1_000 };
        assert!(!runtime(ProposalState::Queued, Some(1_001), false).actions(&head).can_execute);
        assert!(runtime(ProposalState::Queued, Some(1_000), false).actions(&head).can_execute);
        assert!(!runtime(ProposalState::Queued, None, false).actions(&head).can_execute);
        assert!(!runtime(ProposalState::Succeeded, Some(10), false).actions(&head).can_execute);
        assert!(runtime(ProposalState::Succeeded, None, false).actions(&head).can_queue);
    }

    #[test]
    fn countdowns_saturate() {
        let head = ChainHead { block_number: 150, timestamp: 1_000 };
        let rt = runtime(ProposalState::Queued, Some(1_600), false);
        assert_eq!(rt.blocks_until_snapshot(&head), 0);
        assert_eq!(rt.blocks_until_deadline(&head), 50);
        assert_eq!(rt.seconds_until_executable(&head), Some(600));
    }

    #[test]
    fn support_codes_round_trip() {
        for support in 0u8..3 {
            assert_eq!(VoteDirection::from_support(support).support(), Some(support));
        }
        assert_eq!(VoteDirection::from_support(7), VoteDirection::None);
    }
}

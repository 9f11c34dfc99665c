//! Calldata builders for governor and registry write calls
//!
//! Signing and submission happen in the wallet; this module only produces
//! the `to` / `data` / `value` a wallet needs.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use serde::Serialize;

use crate::contracts::governor::{castVoteCall, castVoteWithReasonCall, executeCall, proposeCall, queueCall};
use crate::contracts::registry::{publishDappCall, upgradeDappCall};
use crate::core::{IndexerError, IndexerResult};
use crate::models::proposal::{ProposalRecord, VoteDirection};

/// An unsigned transaction request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// `descriptionHash` argument for `queue` / `execute`
pub fn description_hash(description: &str) -> B256 {
    keccak256(description.as_bytes())
}

/// Index-aligned proposal actions plus description
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProposalDraft {
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub calldatas: Vec<Bytes>,
    pub description: String,
}

impl ProposalDraft {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_action(mut self, target: Address, value: U256, calldata: Bytes) -> Self {
        self.targets.push(target);
        self.values.push(value);
        self.calldatas.push(calldata);
        self
    }

    /// Draft for a proposal that publishes a new dapp through the registry
    pub fn publish_dapp(
        registry: Address,
        root_content_id: &str,
        name: &str,
        version_label: &str,
        description: &str,
        proposal_description: impl Into<String>,
    ) -> Self {
        let call = publishDappCall {
            rootCid: Bytes::copy_from_slice(root_content_id.as_bytes()),
            name: name.to_string(),
            version: version_label.to_string(),
            description: description.to_string(),
        };
        Self::new(proposal_description).with_action(registry, U256::ZERO, call.abi_encode().into())
    }

    /// Draft for a proposal that upgrades an existing dapp
    pub fn upgrade_dapp(
        registry: Address,
        dapp_id: U256,
        root_content_id: &str,
        name: &str,
        version_label: &str,
        description: &str,
        proposal_description: impl Into<String>,
    ) -> Self {
        let call = upgradeDappCall {
            dappId: dapp_id,
            rootCid: Bytes::copy_from_slice(root_content_id.as_bytes()),
            name: name.to_string(),
            version: version_label.to_string(),
            description: description.to_string(),
        };
        Self::new(proposal_description).with_action(registry, U256::ZERO, call.abi_encode().into())
    }

    /// Rebuild the draft of an existing proposal, for queue and execute
    pub fn from_proposal(proposal: &ProposalRecord) -> Self {
        Self {
            targets: proposal.targets.clone(),
            values: proposal.values.clone(),
            calldatas: proposal.calldatas.clone(),
            description: proposal.description.clone(),
        }
    }

    pub fn validate(&self) -> IndexerResult<()> {
        if self.targets.is_empty() {
            return Err(IndexerError::InvalidDraft("proposal has no actions".to_string()));
        }
        if self.values.len() != self.targets.len() || self.calldatas.len() != self.targets.len() {
            return Err(IndexerError::InvalidDraft(format!(
                "misaligned actions: {} targets, {} values, {} calldatas",
                self.targets.len(),
                self.values.len(),
                self.calldatas.len()
            )));
        }
        if self.description.trim().is_empty() {
            return Err(IndexerError::InvalidDraft("description is empty".to_string()));
        }
        Ok(())
    }

    pub fn description_hash(&self) -> B256 {
        description_hash(&self.description)
    }
}

/// Builds governor write transactions
#[derive(Debug, Clone, Copy)]
pub struct GovernorTransactions {
    governor: Address,
}

impl GovernorTransactions {
    pub fn new(governor: Address) -> Self {
        Self { governor }
    }

    fn request(&self, data: Vec<u8>, value: U256) -> TransactionRequest {
        TransactionRequest {
            to: self.governor,
            data: data.into(),
            value,
        }
    }

    pub fn propose(&self, draft: &ProposalDraft) -> IndexerResult<TransactionRequest> {
        draft.validate()?;
        let call = proposeCall {
            targets: draft.targets.clone(),
            values: draft.values.clone(),
            calldatas: draft.calldatas.clone(),
            description: draft.description.clone(),
        };
        Ok(self.request(call.abi_encode(), U256::ZERO))
    }

    pub fn cast_vote(
        &self,
        proposal_id: U256,
        direction: VoteDirection,
        reason: Option<&str>,
    ) -> IndexerResult<TransactionRequest> {
        let support = direction
            .support()
            .ok_or_else(|| IndexerError::InvalidDraft("vote direction must be for, against or abstain".to_string()))?;
        let data = match reason.filter(|r| !r.is_empty()) {
            Some(reason) => castVoteWithReasonCall {
                proposalId: proposal_id,
                support,
                reason: reason.to_string(),
            }
            .abi_encode(),
            None => castVoteCall { proposalId: proposal_id, support }.abi_encode(),
        };
        Ok(self.request(data, U256::ZERO))
    }

    pub fn queue(&self, draft: &ProposalDraft) -> IndexerResult<TransactionRequest> {
        draft.validate()?;
        let call = queueCall {
            targets: draft.targets.clone(),
            values: draft.values.clone(),
            calldatas: draft.calldatas.clone(),
            descriptionHash: draft.description_hash(),
        };
        Ok(self.request(call.abi_encode(), U256::ZERO))
    }

    /// `execute` forwards the sum of the action values
    pub fn execute(&self, draft: &ProposalDraft) -> IndexerResult<TransactionRequest> {
        draft.validate()?;
        let total = draft
            .values
            .iter()
            .try_fold(U256::ZERO, |acc, v| acc.checked_add(*v))
            .ok_or_else(|| IndexerError::InvalidDraft("action values overflow".to_string()))?;
        let call = executeCall {
            targets: draft.targets.clone(),
            values: draft.values.clone(),
            calldatas: draft.calldatas.clone(),
            descriptionHash: draft.description_hash(),
        };
        Ok(self.request(call.abi_encode(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::bundle::decode_bundle_call;
    use crate::models::bundle::BundleAction;

    fn registry() -> Address {
        Address::repeat_byte(0x22)
    }

    #[test]
    fn description_hash_is_keccak_of_utf8() {
        assert_eq!(description_hash(""), alloy_primitives::b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"));
    }

    #[test]
    fn vote_encodes_support_codes() {
        let txs = GovernorTransactions::new(Address::repeat_byte(0x11));
        let tx = txs.cast_vote(U256::from(7u64), VoteDirection::Abstain, None).unwrap();
        let decoded = castVoteCall::abi_decode(&tx.data, true).unwrap();
        assert_eq!(decoded.support, 2);
        assert_eq!(decoded.proposalId, U256::from(7u64));

        let with_reason = txs
            .cast_vote(U256::from(7u64), VoteDirection::Against, Some("too risky"))
            .unwrap();
        let decoded = castVoteWithReasonCall::abi_decode(&with_reason.data, true).unwrap();
        assert_eq!(decoded.support, 0);
        assert_eq!(decoded.reason, "too risky");

        assert!(txs.cast_vote(U256::from(7u64), VoteDirection::None, None).is_err());
    }

    #[test]
    fn publish_draft_round_trips_through_extractor() {
        let draft = ProposalDraft::publish_dapp(registry(), "bafyAAA", "Notes", "1.0.0", "notes app", "Publish Notes");
        let reference = decode_bundle_call(&draft.calldatas[0]).unwrap();
        assert_eq!(reference.action, BundleAction::Publish);
        assert_eq!(reference.root_content_id, "bafyAAA");
        assert_eq!(reference.dapp_id, None);
    }

    #[test]
    fn misaligned_draft_is_rejected() {
        let mut draft = ProposalDraft::new("broken").with_action(registry(), U256::ZERO, Bytes::new());
        draft.values.push(U256::from(1u64));
        let txs = GovernorTransactions::new(Address::repeat_byte(0x11));
        assert!(matches!(txs.propose(&draft), Err(IndexerError::InvalidDraft(_))));
        assert!(txs.propose(&ProposalDraft::new("empty")).is_err());
    }

    #[test]
    fn execute_carries_total_value_and_hash() {
        let draft = ProposalDraft::new("pay two")
            .with_action(registry(), U256::from(3u64), Bytes::new())
            .with_action(registry(), U256::from(4u64), Bytes::new());
        let tx = GovernorTransactions::new(Address::repeat_byte(0x11)).execute(&draft).unwrap();
        assert_eq!(tx.value, U256::from(7u64));
        let decoded = executeCall::abi_decode(&tx.data, true).unwrap();
        assert_eq!(decoded.descriptionHash, description_hash("pay two"));
    }
}

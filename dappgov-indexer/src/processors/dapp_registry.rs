//! Dapp registry event projector
//!
//! Six independent log streams are merged into one chain-ordered timeline
//! and folded into per-dapp, per-version records.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::contracts::registry::{
    DappDeprecated, DappMetadata, DappPaused, DappPublished, DappUnpaused, DappUpgraded,
};
use crate::core::{ChainReader, EventPosition, IndexerError, IndexerResult, RawLog};
use crate::models::bundle::decode_content_id;
use crate::models::dapp::{DappRecord, DappRow, DappStatus};

use super::log_fetcher::LogFetcher;

/// Topic0 of every registry event the projector folds
pub const REGISTRY_EVENT_TOPICS: [B256; 6] = [
    DappPublished::SIGNATURE_HASH,
    DappUpgraded::SIGNATURE_HASH,
    DappMetadata::SIGNATURE_HASH,
    DappPaused::SIGNATURE_HASH,
    DappUnpaused::SIGNATURE_HASH,
    DappDeprecated::SIGNATURE_HASH,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEventKind {
    Published { root_content_id: String },
    Upgraded { root_content_id: String },
    Metadata { name: String, version_label: String, description: String },
    Paused,
    Unpaused,
    Deprecated,
}

/// One decoded registry event on the merged timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEvent {
    pub position: EventPosition,
    pub dapp_id: U256,
    pub version_id: U256,
    pub kind: RegistryEventKind,
}

/// Decode any of the six registry event shapes, dispatching on topic0
pub fn decode_registry_event(log: &RawLog) -> IndexerResult<RegistryEvent> {
    let topic0 = log
        .topic0()
        .ok_or_else(|| IndexerError::Decode("log has no topics".to_string()))?;
    let topics = log.topics.iter().copied();
    let data = &log.data;

    let (dapp_id, version_id, kind) = if *topic0 == DappPublished::SIGNATURE_HASH {
        let e = DappPublished::decode_raw_log(topics, data, true)?;
        let root_content_id = decode_content_id(&e.rootCid);
        (e.dappId, e.versionId, RegistryEventKind::Published { root_content_id })
    } else if *topic0 == DappUpgraded::SIGNATURE_HASH {
        let e = DappUpgraded::decode_raw_log(topics, data, true)?;
        let root_content_id = decode_content_id(&e.rootCid);
        (e.dappId, e.versionId, RegistryEventKind::Upgraded { root_content_id })
    } else if *topic0 == DappMetadata::SIGNATURE_HASH {
        let e = DappMetadata::decode_raw_log(topics, data, true)?;
        let kind = RegistryEventKind::Metadata {
            name: e.name,
            version_label: e.version,
            description: e.description,
        };
        (e.dappId, e.versionId, kind)
    } else if *topic0 == DappPaused::SIGNATURE_HASH {
        let e = DappPaused::decode_raw_log(topics, data, true)?;
        (e.dappId, e.versionId, RegistryEventKind::Paused)
    } else if *topic0 == DappUnpaused::SIGNATURE_HASH {
        let e = DappUnpaused::decode_raw_log(topics, data, true)?;
        (e.dappId, e.versionId, RegistryEventKind::Unpaused)
    } else if *topic0 == DappDeprecated::SIGNATURE_HASH {
        let e = DappDeprecated::decode_raw_log(topics, data, true)?;
        (e.dappId, e.versionId, RegistryEventKind::Deprecated)
    } else {
        return Err(IndexerError::Decode(format!("unknown registry event {topic0}")));
    };

    Ok(RegistryEvent {
        position: log.position(),
        dapp_id,
        version_id,
        kind,
    })
}

/// Fold a timeline into dapp records. Events are sorted by chain position
/// first, so input order across streams does not matter.
pub fn fold_registry_events(mut events: Vec<RegistryEvent>) -> BTreeMap<U256, DappRecord> {
    events.sort_by_key(|e| e.position);

    let mut dapps: BTreeMap<U256, DappRecord> = BTreeMap::new();
    for event in events {
        let dapp = dapps
            .entry(event.dapp_id)
            .or_insert_with(|| DappRecord::new(event.dapp_id));
        match event.kind {
            RegistryEventKind::Published { root_content_id }
            | RegistryEventKind::Upgraded { root_content_id } => {
                let version = dapp.version_mut(event.version_id);
                version.root_content_id = root_content_id;
                version.status = DappStatus::Published;
                dapp.latest_version_id = Some(event.version_id);
            }
            RegistryEventKind::Metadata { name, version_label, description } => {
                let version = dapp.version_mut(event.version_id);
                version.name = name;
                version.version_label = version_label;
                version.description = description;
            }
            RegistryEventKind::Paused => {
                dapp.version_mut(event.version_id).status = DappStatus::Paused;
            }
            RegistryEventKind::Unpaused => {
                dapp.version_mut(event.version_id).status = DappStatus::Published;
            }
            RegistryEventKind::Deprecated => {
                dapp.version_mut(event.version_id).status = DappStatus::Deprecated;
            }
        }
    }
    dapps
}

/// Projects the dapp registry into latest-version rows
pub struct DappRegistryProcessor<C: ChainReader + ?Sized> {
    fetcher: LogFetcher<C>,
}

impl<C: ChainReader + ?Sized> DappRegistryProcessor<C> {
    pub fn new(fetcher: LogFetcher<C>) -> Self {
        Self { fetcher }
    }

    /// Decoded registry timeline in chain order
    pub async fn timeline(&self, registry: Address, from_block: u64) -> IndexerResult<Vec<RegistryEvent>> {
        let [published, upgraded, metadata, paused, unpaused, deprecated] = REGISTRY_EVENT_TOPICS;
        let fetch = |topic0: B256| self.fetcher.fetch_logs(registry, topic0, &[], from_block);
        let streams = futures::try_join!(
            fetch(published),
            fetch(upgraded),
            fetch(metadata),
            fetch(paused),
            fetch(unpaused),
            fetch(deprecated),
        )?;

        let (a, b, c, d, e, f) = streams;
        let mut events: Vec<RegistryEvent> = [a, b, c, d, e, f]
            .iter()
            .flatten()
            .filter_map(|log| match decode_registry_event(log) {
                Ok(event) => Some(event),
                Err(e) => {
                    debug!(position = %log.position(), error = %e, "dropping undecodable registry log");
                    None
                }
            })
            .collect();
        events.sort_by_key(|e| e.position);
        Ok(events)
    }

    /// Full per-version projection
    pub async fn project(&self, registry: Address, from_block: u64) -> IndexerResult<BTreeMap<U256, DappRecord>> {
        let events = self.timeline(registry, from_block).await?;
        let event_count = events.len();
        let dapps = fold_registry_events(events);
        info!(%registry, events = event_count, dapps = dapps.len(), "projected dapp registry");
        Ok(dapps)
    }

    /// One row per dapp, reflecting only its latest version
    pub async fn list_dapps(&self, registry: Address, from_block: u64) -> IndexerResult<Vec<DappRow>> {
        let dapps = self.project(registry, from_block).await?;
        Ok(dapps.values().filter_map(DappRecord::row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(dapp: u64, version: u64, block: u64, index: u64, kind: RegistryEventKind) -> RegistryEvent {
        RegistryEvent {
            position: EventPosition::new(block, index),
            dapp_id: U256::from(dapp),
            version_id: U256::from(version),
            kind,
        }
    }

    fn published(cid: &str) -> RegistryEventKind {
        RegistryEventKind::Published { root_content_id: cid.to_string() }
    }

    #[test]
    fn fold_uses_chain_order_not_input_order() {
        // pause arrives first in input but happened after the publish
        let events = vec![
            event(1, 1, 12, 0, RegistryEventKind::Paused),
            event(1, 1, 10, 0, published("bafyAAA")),
        ];
        let dapps = fold_registry_events(events);
        let row = dapps[&U256::from(1u64)].row().unwrap();
        assert_eq!(row.status, DappStatus::Paused);
        assert_eq!(row.root_content_id, "bafyAAA");
    }

    #[test]
    fn upgrade_moves_latest_and_keeps_history() {
        let events = vec![
            event(3, 1, 10, 0, published("bafyOLD")),
            event(3, 2, 20, 1, RegistryEventKind::Upgraded { root_content_id: "bafyNEW".into() }),
            event(3, 1, 21, 0, RegistryEventKind::Deprecated),
        ];
        let dapps = fold_registry_events(events);
        let dapp = &dapps[&U256::from(3u64)];
        assert_eq!(dapp.latest_version_id, Some(U256::from(2u64)));
        assert_eq!(dapp.versions.len(), 2);
        assert_eq!(dapp.versions[&U256::from(1u64)].status, DappStatus::Deprecated);
        let row = dapp.row().unwrap();
        assert_eq!(row.root_content_id, "bafyNEW");
        assert_eq!(row.status, DappStatus::Published);
    }

    #[test]
    fn metadata_alone_has_no_visible_row() {
        let events = vec![event(
            9,
            1,
            5,
            0,
            RegistryEventKind::Metadata {
                name: "orphan".into(),
                version_label: "1.0.0".into(),
                description: String::new(),
            },
        )];
        let dapps = fold_registry_events(events);
        let dapp = &dapps[&U256::from(9u64)];
        assert!(dapp.row().is_none());
        assert_eq!(dapp.versions[&U256::from(1u64)].status, DappStatus::Unknown);
    }

    #[test]
    fn unpause_restores_published() {
        let events = vec![
            event(2, 1, 1, 0, published("bafyX")),
            event(2, 1, 2, 0, RegistryEventKind::Paused),
            event(2, 1, 3, 0, RegistryEventKind::Unpaused),
        ];
        let row = fold_registry_events(events)[&U256::from(2u64)].row().unwrap();
        assert_eq!(row.status, DappStatus::Published);
    }
}

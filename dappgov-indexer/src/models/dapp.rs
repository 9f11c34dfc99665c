//! Dapp registry data models

use alloy_primitives::U256;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Status of a single dapp version
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub enum DappStatus {
    Published,
    Paused,
    Deprecated,
    #[default]
    Unknown,
}

impl fmt::Display for DappStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DappStatus::Published => "Published",
            DappStatus::Paused => "Paused",
            DappStatus::Deprecated => "Deprecated",
            DappStatus::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DappVersionRecord {
    pub version_id: U256,
    pub root_content_id: String,
    pub name: String,
    pub version_label: String,
    pub description: String,
    pub status: DappStatus,
}

impl DappVersionRecord {
    pub fn empty(version_id: U256) -> Self {
        Self {
            version_id,
            root_content_id: String::new(),
            name: String::new(),
            version_label: String::new(),
            description: String::new(),
            status: DappStatus::Unknown,
        }
    }
}

/// All known versions of one dapp plus the pointer to its current version
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DappRecord {
    pub dapp_id: U256,
    /// Unset until a publish or upgrade for this dapp has been folded
    pub latest_version_id: Option<U256>,
    pub versions: BTreeMap<U256, DappVersionRecord>,
}

impl DappRecord {
    pub fn new(dapp_id: U256) -> Self {
        Self {
            dapp_id,
            latest_version_id: None,
            versions: BTreeMap::new(),
        }
    }

    /// Version entry, created empty when first addressed
    pub fn version_mut(&mut self, version_id: U256) -> &mut DappVersionRecord {
        self.versions
            .entry(version_id)
            .or_insert_with(|| DappVersionRecord::empty(version_id))
    }

    pub fn latest(&self) -> Option<&DappVersionRecord> {
        self.latest_version_id.and_then(|id| self.versions.get(&id))
    }

    /// Externally visible row: the latest version only
    pub fn row(&self) -> Option<DappRow> {
        self.latest().map(|version| DappRow {
            dapp_id: self.dapp_id,
            version_id: version.version_id,
            root_content_id: version.root_content_id.clone(),
            name: version.name.clone(),
            version_label: version.version_label.clone(),
            description: version.description.clone(),
            status: version.status,
        })
    }
}

/// Latest-version view of a dapp
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DappRow {
    pub dapp_id: U256,
    pub version_id: U256,
    pub root_content_id: String,
    pub name: String,
    pub version_label: String,
    pub description: String,
    pub status: DappStatus,
}

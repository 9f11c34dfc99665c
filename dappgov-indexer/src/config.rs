//! Configuration management for the governance indexer
//!
//! Settings come from an optional TOML file layered under `DAPPGOV__*`
//! environment variables. Network entries are merged key-by-key over a
//! built-in default table once at startup; the result is read-only.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use validator::Validate;

use crate::core::{IndexerError, IndexerResult};

/// Environment variable prefix, e.g. `DAPPGOV__RPC__URL`
pub const ENV_PREFIX: &str = "DAPPGOV";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexerConfig {
    /// Name of the network to operate on
    pub network: String,
    pub rpc: RpcConfig,
    pub indexer: IndexerSettings,
    pub monitoring: MonitoringConfig,
    /// Deployment overrides, keyed by network name
    pub networks: BTreeMap<String, NetworkOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct RpcConfig {
    #[validate(url)]
    pub url: String,
    #[validate(range(min = 1, max = 60))]
    pub connect_timeout_secs: u64,
    #[validate(range(min = 1, max = 300))]
    pub read_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct IndexerSettings {
    /// Widest block range of a single `eth_getLogs` call
    #[validate(range(min = 1, max = 1_000_000))]
    pub max_block_window: u64,
    /// Listing attempts while waiting for a freshly submitted proposal
    #[validate(range(min = 1, max = 100))]
    pub new_proposal_attempts: u32,
    #[validate(range(min = 100, max = 60_000))]
    pub new_proposal_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub structured_logging: bool,
}

/// Per-network override; every field is optional
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq, Default)]
#[serde(default)]
pub struct NetworkOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[validate(url)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub governor: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_block: Option<u64>,
}

/// A network entry after defaults and overrides were merged
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSettings {
    pub chain_id: u64,
    pub rpc_url: Option<String>,
    pub governor: Option<Address>,
    pub registry: Option<Address>,
    pub start_block: u64,
}

impl NetworkSettings {
    fn bare(chain_id: u64) -> Self {
        Self {
            chain_id,
            rpc_url: None,
            governor: None,
            registry: None,
            start_block: 0,
        }
    }

    fn apply(&mut self, overrides: &NetworkOverride) {
        if let Some(chain_id) = overrides.chain_id {
            self.chain_id = chain_id;
        }
        if let Some(rpc_url) = &overrides.rpc_url {
            self.rpc_url = Some(rpc_url.clone());
        }
        if let Some(governor) = overrides.governor {
            self.governor = Some(governor);
        }
        if let Some(registry) = overrides.registry {
            self.registry = Some(registry);
        }
        if let Some(start_block) = overrides.start_block {
            self.start_block = start_block;
        }
    }
}

/// Fully resolved deployment the service operates on
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: Option<String>,
    pub governor: Address,
    pub registry: Address,
    pub start_block: u64,
}

/// Built-in network defaults
pub fn default_networks() -> BTreeMap<String, NetworkSettings> {
    let mut networks = BTreeMap::new();
    networks.insert("mainnet".to_string(), NetworkSettings::bare(1));
    networks.insert("sepolia".to_string(), NetworkSettings::bare(11_155_111));
    networks.insert(
        "localhost".to_string(),
        NetworkSettings {
            rpc_url: Some("http://127.0.0.1:8545".to_string()),
            ..NetworkSettings::bare(31_337)
        },
    );
    networks
}

/// Immutable network table: defaults with overrides applied
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NetworkTable {
    entries: BTreeMap<String, NetworkSettings>,
}

impl NetworkTable {
    /// Merge `overrides` over `defaults` key-by-key. A network that only
    /// exists in the overrides must name its chain id.
    pub fn merged(
        defaults: BTreeMap<String, NetworkSettings>,
        overrides: &BTreeMap<String, NetworkOverride>,
    ) -> IndexerResult<Self> {
        let mut entries = defaults;
        for (name, overrides) in overrides {
            match entries.get_mut(name) {
                Some(settings) => settings.apply(overrides),
                None => {
                    let chain_id = overrides.chain_id.ok_or_else(|| {
                        IndexerError::Configuration(format!("network {name} needs a chain_id"))
                    })?;
                    let mut settings = NetworkSettings::bare(chain_id);
                    settings.apply(overrides);
                    entries.insert(name.clone(), settings);
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&NetworkSettings> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Name of the first network registered for `chain_id`
    pub fn name_for_chain(&self, chain_id: u64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, settings)| settings.chain_id == chain_id)
            .map(|(name, _)| name.as_str())
    }

    /// Resolve a network into a usable profile. Unknown networks and missing
    /// contract addresses are missing prerequisites.
    pub fn resolve(&self, name: &str) -> IndexerResult<NetworkProfile> {
        let settings = self
            .get(name)
            .ok_or_else(|| {
                let known: Vec<&str> = self.names().collect();
                IndexerError::missing(format!("unknown network {name}, known: {}", known.join(", ")))
            })?;
        let governor = settings
            .governor
            .ok_or_else(|| IndexerError::missing(format!("no governor address configured for {name}")))?;
        let registry = settings
            .registry
            .ok_or_else(|| IndexerError::missing(format!("no registry address configured for {name}")))?;
        Ok(NetworkProfile {
            name: name.to_string(),
            chain_id: settings.chain_id,
            rpc_url: settings.rpc_url.clone(),
            governor,
            registry,
            start_block: settings.start_block,
        })
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            network: "localhost".to_string(),
            rpc: RpcConfig::default(),
            indexer: IndexerSettings::default(),
            monitoring: MonitoringConfig::default(),
            networks: BTreeMap::new(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
        }
    }
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            max_block_window: 10_000,
            new_proposal_attempts: 10,
            new_proposal_delay_ms: 3_000,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            structured_logging: false,
        }
    }
}

impl IndexerConfig {
    /// Load from `path` (if it exists) layered under environment variables
    pub fn load(path: &Path) -> IndexerResult<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load strictly from a TOML file, without environment layering
    pub fn from_file(path: &Path) -> IndexerResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| IndexerError::Configuration(format!("{}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| IndexerError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML, e.g. to write a starter config
    pub fn to_toml(&self) -> IndexerResult<String> {
        toml::to_string_pretty(self).map_err(|e| IndexerError::Serialization(e.to_string()))
    }

    /// Validate every section and the merged network table
    pub fn validate(&self) -> IndexerResult<()> {
        self.rpc.validate()?;
        self.indexer.validate()?;
        for overrides in self.networks.values() {
            overrides.validate()?;
        }
        if self.monitoring.log_level.parse::<tracing::Level>().is_err() {
            return Err(IndexerError::Configuration(format!(
                "invalid log level {}",
                self.monitoring.log_level
            )));
        }
        if self.network.is_empty() {
            return Err(IndexerError::Configuration("network cannot be empty".to_string()));
        }
        self.network_table()?;
        Ok(())
    }

    pub fn network_table(&self) -> IndexerResult<NetworkTable> {
        NetworkTable::merged(default_networks(), &self.networks)
    }

    /// Profile of the selected network
    pub fn network_profile(&self) -> IndexerResult<NetworkProfile> {
        self.network_table()?.resolve(&self.network)
    }

    /// RPC settings for `profile`; a network-specific URL wins over `rpc.url`
    pub fn rpc_for(&self, profile: &NetworkProfile) -> RpcConfig {
        RpcConfig {
            url: profile.rpc_url.clone().unwrap_or_else(|| self.rpc.url.clone()),
            ..self.rpc.clone()
        }
    }
}

//! Dapp governance indexer CLI
//!
//! Runs one projection pass against a governor and dapp registry deployment
//! and prints the result as JSON.

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dappgov_indexer::content::{BundlePreview, HttpContentGateway};
use dappgov_indexer::models::content::ContentMode;
use dappgov_indexer::services::ProposalAppearance;
use dappgov_indexer::{GovernanceService, IndexerConfig, LightRpcClient};

#[derive(Parser)]
#[command(name = "dappgov-indexer")]
#[command(about = "Governance and dapp registry projector")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "dappgov.toml")]
    config: PathBuf,

    /// Override the configured network
    #[arg(long)]
    network: Option<String>,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List proposals, most recent first
    Proposals,
    /// Runtime facts and allowed actions per proposal
    Runtime {
        #[arg(long)]
        account: Option<Address>,
    },
    /// Latest version of every registered dapp
    Dapps,
    /// Content bundle a proposal publishes or upgrades to
    Bundle {
        #[arg(long)]
        proposal_id: U256,
    },
    /// Full governance snapshot
    Snapshot {
        #[arg(long)]
        account: Option<Address>,
    },
    /// Wait until a freshly created proposal is visible
    AwaitProposal {
        #[arg(long)]
        proposal_id: U256,
    },
    /// Voting power versus proposal threshold
    Eligibility {
        #[arg(long)]
        account: Option<Address>,
    },
    /// Preview the bundle of a proposal through a content gateway
    Preview {
        #[arg(long)]
        proposal_id: U256,
        #[arg(long, default_value = "https://ipfs.io")]
        gateway: String,
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value_t = 4096)]
        max_bytes: usize,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeRow<'a> {
    proposal_id: U256,
    title: &'a str,
    state: String,
    terminal: bool,
    actions: dappgov_indexer::ProposalActions,
    runtime: &'a dappgov_indexer::ProposalRuntimeState,
    executable_at: Option<DateTime<Utc>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = IndexerConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(log_level) = cli.log_level {
        config.monitoring.log_level = log_level;
    }

    init_logging(&config)?;
    if !cli.config.exists() {
        warn!("Config file not found, using defaults and environment: {}", cli.config.display());
    }

    if let Command::Config = cli.command {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    let profile = config.network_profile()?;
    let rpc = config.rpc_for(&profile);
    info!(network = %profile.name, rpc = %rpc.url, governor = %profile.governor, registry = %profile.registry, "starting");

    let chain = Arc::new(LightRpcClient::new(&rpc));
    let service = GovernanceService::connect(chain, profile, config.indexer.clone()).await?;

    match cli.command {
        Command::Proposals => print_json(&service.list_proposals().await?),
        Command::Dapps => print_json(&service.list_dapps().await?),
        Command::Runtime { account } => {
            let proposals = service.list_proposals().await?;
            let runtime = service.enrich(&proposals, account).await?;
            let head = runtime.chain_head;
            let rows: Vec<RuntimeRow<'_>> = proposals
                .iter()
                .filter_map(|p| {
                    let state = runtime.get(&p.proposal_id)?;
                    Some(RuntimeRow {
                        proposal_id: p.proposal_id,
                        title: p.title(),
                        state: state.state.to_string(),
                        terminal: state.state.is_terminal(),
                        actions: state.actions(&head),
                        runtime: state,
                        executable_at: state
                            .execution_eta_seconds
                            .and_then(|eta| DateTime::from_timestamp(i64::try_from(eta).ok()?, 0)),
                    })
                })
                .collect();
            print_json(&rows)
        }
        Command::Bundle { proposal_id } => {
            let proposals = service.list_proposals().await?;
            let proposal = proposals
                .iter()
                .find(|p| p.proposal_id == proposal_id)
                .ok_or_else(|| anyhow!("proposal {proposal_id} not found"))?;
            print_json(&service.bundle_reference(proposal))
        }
        Command::Snapshot { account } => {
            let snapshot = service.refresh(account).await?;
            info!(status = ?snapshot.status(), "snapshot ready");
            print_json(&snapshot)
        }
        Command::AwaitProposal { proposal_id } => match service.await_proposal(proposal_id).await? {
            ProposalAppearance::Found(proposal) => print_json(&proposal),
            ProposalAppearance::IndexingLag { attempts } => {
                warn!("proposal {proposal_id} still not listed after {attempts} attempts; the transaction may need more time to be indexed");
                Ok(())
            }
        },
        Command::Eligibility { account } => {
            let power = service.eligibility(account).await?;
            print_json(&serde_json::json!({
                "power": power,
                "canPropose": power.can_propose(),
            }))
        }
        Command::Preview { proposal_id, gateway, path, max_bytes } => {
            let proposals = service.list_proposals().await?;
            let proposal = proposals
                .iter()
                .find(|p| p.proposal_id == proposal_id)
                .ok_or_else(|| anyhow!("proposal {proposal_id} not found"))?;
            let reference = service
                .bundle_reference(proposal)
                .ok_or_else(|| anyhow!("proposal {proposal_id} does not publish a bundle"))?;
            let preview = BundlePreview::new(Arc::new(HttpContentGateway::new(gateway, Duration::from_secs(15))));
            let mode = ContentMode::Excerpt { max_bytes };
            print_json(&preview.fetch(&reference, path.as_deref(), mode).await?)
        }
        Command::Config => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(config: &IndexerConfig) -> Result<()> {
    let log_level = config
        .monitoring
        .log_level
        .parse()
        .unwrap_or(tracing::Level::INFO);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("dappgov_indexer={log_level}").into());

    // Logs go to stderr so stdout stays parseable JSON
    if config.monitoring.structured_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

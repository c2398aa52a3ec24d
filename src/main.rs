//! Transaction submitter service.
//!
//! ```text
//!   config.toml ──▶ BlockchainClient ──┬──▶ ContractStateQuery ──▶ pause / authorization monitors
//!   SUBMITTER_PRIVATE_KEY ──▶ Wallet ──┤                                   │ (ReactiveValue<bool>)
//!                                      │                                   ▼
//!                                      └──▶ TxSender ──────────────▶ SubmissionEngine ──▶ receipt
//!                                                                                         │
//!                                                              JSON ABI ──▶ find_event ◀──┘
//! ```

use alloy::json_abi::JsonAbi;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use tx_submitter::blockchain::{BlockchainClient, ChainClient, TransactionSender, TxSender, Wallet};
use tx_submitter::config::load_config;
use tx_submitter::events::find_event;
use tx_submitter::monitor::{monitor_authorization, monitor_pause, ContractStateQuery};
use tx_submitter::observability::{logging, metrics};
use tx_submitter::submission::{Outcome, SubmissionEngine};

#[derive(Parser)]
#[command(name = "tx-submitter")]
#[command(about = "Submit transactions with fee gating, retries and network-state monitors", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pause and authorization monitors until Ctrl-C
    Monitor,
    /// Submit one call and print the outcome as JSON
    Send {
        /// Recipient contract or account.
        #[arg(long)]
        to: Address,

        /// Calldata as 0x-prefixed hex.
        #[arg(long, default_value = "0x")]
        data: Bytes,

        /// Value in wei.
        #[arg(long, default_value = "0")]
        value: U256,

        /// JSON ABI file used to search the receipt for an event.
        #[arg(long, requires_all = ["event", "field", "equals"])]
        abi: Option<PathBuf>,

        /// Event name to search for.
        #[arg(long)]
        event: Option<String>,

        /// Event input to compare.
        #[arg(long)]
        field: Option<String>,

        /// Expected value of the input, compared case-insensitively.
        #[arg(long)]
        equals: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability);
    tracing::info!(config = %cli.config.display(), "tx-submitter v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = BlockchainClient::new(config.blockchain.clone()).await?;
    let wallet = Wallet::from_env(config.blockchain.chain_id)?;
    let sender = Arc::new(TxSender::new(client.clone(), wallet));
    let chain: Arc<dyn ChainClient> = Arc::new(client);

    let registry: Address = config.monitor.registry_address.parse()?;
    let principal = match &config.monitor.principal {
        Some(principal) => principal.parse()?,
        None => sender.address(),
    };
    let query = Arc::new(ContractStateQuery::new(chain.clone(), registry));

    let paused = monitor_pause(query.clone(), config.monitor.pause_interval());
    let authorized = monitor_authorization(
        query,
        sender.address(),
        principal,
        config.monitor.authorization_interval(),
    );

    match cli.command {
        Commands::Monitor => {
            tracing::info!(
                registry = %registry,
                operator = %sender.address(),
                principal = %principal,
                "Monitoring network state, press Ctrl-C to stop"
            );
            tokio::signal::ctrl_c().await?;
            tracing::info!(
                paused = ?paused.latest(),
                authorized = ?authorized.latest(),
                "Shutdown signal received"
            );
        }
        Commands::Send {
            to,
            data,
            value,
            abi,
            event,
            field,
            equals,
        } => {
            let engine = SubmissionEngine::new(
                chain,
                sender,
                paused,
                authorized,
                config.submission.clone(),
                config.blockchain.chain_id,
            );
            let call = TransactionRequest::default()
                .with_to(to)
                .with_input(data)
                .with_value(value);

            let outcome = tokio::select! {
                result = engine.execute(call) => result?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("Interrupted, the last broadcast may still confirm");
                    return Ok(());
                }
            };

            let mut report = match &outcome {
                Outcome::Confirmed(receipt) => serde_json::json!({
                    "outcome": outcome.label(),
                    "transaction_hash": receipt.transaction_hash.to_string(),
                    "block_number": receipt.block_number,
                    "gas_used": receipt.gas_used,
                }),
                Outcome::GaveUp {
                    attempts,
                    last_tx_hash,
                } => serde_json::json!({
                    "outcome": outcome.label(),
                    "attempts": attempts,
                    "last_transaction_hash": last_tx_hash.map(|hash| hash.to_string()),
                }),
                Outcome::Paused | Outcome::Unauthorized => {
                    serde_json::json!({ "outcome": outcome.label() })
                }
            };

            if let (Outcome::Confirmed(receipt), Some(path), Some(event), Some(field), Some(equals)) =
                (&outcome, abi, event, field, equals)
            {
                let abi: JsonAbi = serde_json::from_str(&std::fs::read_to_string(path)?)?;
                let found = find_event(&event, &abi, &field, &equals, receipt)?;
                report["event"] = match found {
                    Some(log) => serde_json::json!({
                        "name": log.name,
                        "address": log.address.to_string(),
                        "fields": log
                            .rendered()
                            .into_iter()
                            .map(|(name, value)| (name, serde_json::Value::String(value)))
                            .collect::<serde_json::Map<_, _>>(),
                    }),
                    None => serde_json::Value::Null,
                };
            }

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

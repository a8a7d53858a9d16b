//! `ethscribe` command-line tool.

use std::path::PathBuf;

use alloy::primitives::{Address, TxHash};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use ethscribe::blockchain::{BlockchainClient, TxSender, Wallet};
use ethscribe::config::{load_or_default, AppConfig};
use ethscribe::content::resolver::InscribedItem;
use ethscribe::content::{decode, ContentResolver, NodeChainReader, StaticStore};
use ethscribe::escrow::{EscrowVerifier, OwnerIndexClient, PreferenceStore, ReconcilePreferences, Reconciler};
use ethscribe::observability::{init_logging, metrics};
use ethscribe::withdrawal::{ContractSubmitter, HttpSignerService, WithdrawalRequestBuilder};

#[derive(Parser)]
#[command(name = "ethscribe")]
#[command(about = "Resolve ethscription content and withdraw escrowed items", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a raw data URI
    Decode { raw: String },
    /// Resolve an inscription by transaction hash
    Resolve {
        #[arg(long)]
        hash: TxHash,
        #[arg(long, default_value = "")]
        sha: String,
        /// Use the hosted rendition (requires --sha)
        #[arg(long, requires = "sha")]
        hosted: bool,
    },
    /// List verified escrowed items for an owner
    Escrowed {
        #[arg(long)]
        owner: Address,
    },
    /// Withdraw escrowed items (all verified items when no ids are given)
    Withdraw {
        #[arg(long)]
        owner: Address,
        ids: Vec<String>,
    },
    /// Stop showing the pending-withdrawal notice
    Dismiss,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    init_logging(&config.observability);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let http = reqwest::Client::new();

    match cli.command {
        Commands::Decode { raw } => print_json(&decode(&raw))?,
        Commands::Resolve { hash, sha, hosted } => {
            let client = BlockchainClient::new(config.chain.clone()).await?;
            let store = StaticStore::new(http, &config.static_store);
            let resolver = ContentResolver::new(NodeChainReader::new(client, store));
            let item = InscribedItem {
                hash_id: hash,
                sha,
                is_supported: hosted,
            };
            match resolver.resolve(&item).await? {
                Some(content) => print_json(&content)?,
                None => eprintln!("Inscription {} carries no data", hash),
            }
        }
        Commands::Escrowed { owner } => {
            let preferences = load_preferences(&config)?;
            match reconciler(&config, http, &preferences)?.run(Some(owner)).await {
                Some(verified) => print_json(&verified)?,
                None => eprintln!("{}", unavailable_message(&preferences)),
            }
        }
        Commands::Withdraw { owner, ids } => {
            let ids = if ids.is_empty() {
                let preferences = load_preferences(&config)?;
                match reconciler(&config, http.clone(), &preferences)?.run(Some(owner)).await {
                    Some(verified) => verified.into_ids(),
                    None => {
                        eprintln!("{}", unavailable_message(&preferences));
                        return Ok(());
                    }
                }
            } else {
                ids
            };
            if ids.is_empty() {
                println!("Nothing to withdraw");
                return Ok(());
            }
            withdraw(&config, http, owner, &ids).await?;
        }
        Commands::Dismiss => {
            let mut store = PreferenceStore::open(config.preferences.path.as_deref())?;
            store.dismiss_withdrawal_notice()?;
            println!("Withdrawal notice dismissed");
        }
    }

    Ok(())
}

fn load_preferences(config: &AppConfig) -> Result<ReconcilePreferences, Box<dyn std::error::Error>> {
    let store = PreferenceStore::open(config.preferences.path.as_deref())?;
    Ok(store.preferences().clone())
}

fn reconciler(
    config: &AppConfig,
    http: reqwest::Client,
    preferences: &ReconcilePreferences,
) -> Result<Reconciler, Box<dyn std::error::Error>> {
    let index = OwnerIndexClient::new(http.clone(), config.owner_index.clone());
    let verifier = EscrowVerifier::new(http, config.verification_index.clone())?;
    Ok(Reconciler::new(index, verifier, preferences.clone()))
}

/// Explains an empty reconciliation result. A dismissed notice skips the
/// run entirely, which is not the same as the indexes being unreachable.
fn unavailable_message(preferences: &ReconcilePreferences) -> &'static str {
    if preferences.withdrawal_notice_dismissed {
        "Withdrawal notice dismissed; escrow reconciliation skipped"
    } else {
        "Escrow state unavailable"
    }
}

async fn withdraw(
    config: &AppConfig,
    http: reqwest::Client,
    owner: Address,
    ids: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let wallet = Wallet::from_env(config.chain.chain_id)?;
    if wallet.address() != owner {
        return Err(format!("wallet {} does not own escrow for {}", wallet.address(), owner).into());
    }

    let client = BlockchainClient::new(config.chain.clone()).await?;
    let contract: Address = config.withdrawal.escrow_contract.parse()?;
    let submitter = ContractSubmitter::new(TxSender::new(client, &wallet)?, contract);
    let exchange = HttpSignerService::new(http, &config.withdrawal);
    let builder = WithdrawalRequestBuilder::new(wallet, exchange, submitter);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match builder.build_and_submit(ids, &cancel).await {
        Ok(tx_hash) => {
            println!("{}", tx_hash);
            Ok(())
        }
        Err(e) if e.is_user_cancellation() => {
            eprintln!("Withdrawal cancelled");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! `smpl-wallet` — command-line wallet talking to a node over its frame
//! protocol.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sw_domain::{Config, Wallet};
use sw_node_client::{NodeApi, NodeLocator};
use sw_wallet::{build_transaction, Keypair, TransactionLedger, WalletStore};

#[derive(Parser)]
#[command(name = "smpl-wallet", version, about = "Wallet for the SMPL node")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a new wallet and persist it.
    Create {
        /// Replace an existing wallet file.
        #[arg(long)]
        force: bool,
    },
    /// Print the wallet address.
    Address,
    /// Ask the node for the wallet balance.
    Balance,
    /// Send funds to another address.
    Send {
        /// Recipient address.
        #[arg(long)]
        to: String,
        /// Amount to transfer.
        #[arg(long)]
        amount: f64,
    },
    /// List the transactions touching the wallet address.
    History,
    /// Stream verified blocks from the node until interrupted.
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("smpl_wallet=info,sw_node_client=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);
    tracing::debug!(
        node_url = %config.node.url(),
        wallet_path = %config.wallet.path.display(),
        "configuration loaded"
    );

    let store = WalletStore::new(&config.wallet.path);

    match cli.command {
        Command::Create { force } => create(&store, force),
        Command::Address => {
            println!("{}", load_wallet(&store)?.address);
            Ok(())
        }
        Command::Balance => balance(&config, &store).await,
        Command::Send { to, amount } => send(&config, &store, &to, amount).await,
        Command::History => history(&config, &store).await,
        Command::Watch => watch(&config).await,
    }
}

fn create(store: &WalletStore, force: bool) -> anyhow::Result<()> {
    if store.exists() && !force {
        anyhow::bail!(
            "a wallet already exists at {} (use --force to replace it)",
            store.path().display()
        );
    }

    let keypair = Keypair::generate();
    let wallet = keypair.to_wallet();
    store.save(&wallet)?;

    tracing::info!(path = %store.path().display(), "wallet created");
    println!("{}", wallet.address);
    Ok(())
}

fn load_wallet(store: &WalletStore) -> anyhow::Result<Wallet> {
    store.load()?.ok_or_else(|| {
        anyhow::anyhow!(
            "no wallet found at {} (run `smpl-wallet create` first)",
            store.path().display()
        )
    })
}

fn node_api(config: &Config) -> NodeApi {
    NodeApi::new(NodeLocator::new(config.node.clone()))
}

async fn balance(config: &Config, store: &WalletStore) -> anyhow::Result<()> {
    let wallet = load_wallet(store)?;
    let update = node_api(config).balance_for_address(&wallet.address).await?;
    println!("SMPL {}", update.balance);
    Ok(())
}

async fn send(config: &Config, store: &WalletStore, to: &str, amount: f64) -> anyhow::Result<()> {
    let wallet = load_wallet(store)?;
    let keypair = Keypair::from_private_hex(&wallet.private_key)?;
    let tx = build_transaction(&keypair, to, amount)?;

    let ack = node_api(config).send_transaction(&tx).await?;
    if !ack.is_ok() {
        anyhow::bail!("node rejected the transaction: {}", ack.status);
    }

    println!("sent {amount} to {to}");
    println!("{}", tx.hash);
    Ok(())
}

async fn history(config: &Config, store: &WalletStore) -> anyhow::Result<()> {
    let wallet = load_wallet(store)?;
    let transactions = node_api(config)
        .transactions_for_address(&wallet.address)
        .await?;

    if transactions.is_empty() {
        println!("no transactions");
        return Ok(());
    }
    for tx in &transactions {
        println!("{}  {} -> {}  {}  {}", tx.hash, tx.from, tx.to, tx.amount, tx.timestamp);
    }
    Ok(())
}

async fn watch(config: &Config) -> anyhow::Result<()> {
    let api = node_api(config);
    let mut blocks = api.on_block_verified().await?;

    // Re-announced blocks can repeat transactions; the ledger drops them.
    let mut seen = TransactionLedger::new();

    tracing::info!("watching for verified blocks (ctrl-c to stop)");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            block = blocks.recv() => {
                let Some(block) = block else {
                    anyhow::bail!("node connection closed");
                };
                println!(
                    "block {} (height {}, {} transactions)",
                    block.hash,
                    block.height,
                    block.transactions.len()
                );
                for tx in block.transactions {
                    let line = format!("  {} -> {}  {}", tx.from, tx.to, tx.amount);
                    if seen.add(tx) {
                        println!("{line}");
                    }
                }
            }
        }
    }
    Ok(())
}

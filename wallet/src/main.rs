// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ZENITH Wallet
//!
//! Entry point for the `zenith-wallet` binary. Parses CLI arguments,
//! initializes logging, assembles the client stack, and runs one
//! subcommand to completion.
//!
//! The binary supports six subcommands:
//!
//! - `login`    — sign in with the local development identity and persist the session
//! - `whoami`   — print the signed-in principal, entirely offline
//! - `info`     — print the ledger's token metadata
//! - `balance`  — print an account balance
//! - `transfer` — submit a transfer and report its outcome
//! - `version`  — print build version information

mod cli;
mod logging;
mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use zenith_client::config::Network;
use zenith_client::identity::{
    AuthOutcome, DevIdentityProvider, Principal, SessionManager, SessionStore,
};
use zenith_client::ledger::{HttpGatewayTransport, LedgerClient, LedgerTransport};
use zenith_client::token::{Account, Subaccount};
use zenith_client::workflow::Dashboard;

use cli::{Commands, ConnectArgs, ZenithWalletCli};
use logging::LogFormat;
use store::FileSessionStore;

/// Default log directives when `RUST_LOG` is not set.
const DEFAULT_LOG_DIRECTIVES: &str = "zenith_wallet=info,zenith_client=info";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ZenithWalletCli::parse();

    if let Some(connect) = cli.command.connect() {
        logging::init_logging(
            DEFAULT_LOG_DIRECTIVES,
            LogFormat::from_str_lossy(&connect.log_format),
        );
    }

    match cli.command {
        Commands::Login(args) => login(args.connect).await,
        Commands::Whoami(args) => whoami(args.connect),
        Commands::Info(args) => info(args.connect).await,
        Commands::Balance(args) => balance(args).await,
        Commands::Transfer(args) => transfer(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Expands a leading `~` to the user's home directory.
fn expand_data_dir(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

/// Builds the session manager from the on-disk key and session files.
fn session_manager(data_dir: &Path) -> Result<SessionManager> {
    let seed = store::load_or_create_seed(data_dir)?;
    let provider = DevIdentityProvider::from_seed(seed);
    let session_store = FileSessionStore::new(data_dir);

    Ok(SessionManager::new(
        Arc::new(provider),
        Arc::new(session_store) as Arc<dyn SessionStore>,
    ))
}

/// Connects the gateway transport and wraps it in a ledger client.
async fn ledger_client(connect: &ConnectArgs) -> Result<LedgerClient> {
    let network = Network::from_str_lossy(&connect.network);
    let ledger_id: Principal = connect
        .ledger
        .parse()
        .with_context(|| format!("invalid ledger identifier: {}", connect.ledger))?;

    let transport = match &connect.gateway {
        Some(url) => HttpGatewayTransport::connect_to(network, url).await,
        None => HttpGatewayTransport::connect(network).await,
    }
    .with_context(|| format!("connecting to the {network} gateway"))?;

    tracing::info!(%network, ledger = %ledger_id, gateway = transport.base_url(), "connected");
    Ok(LedgerClient::new(
        Arc::new(transport) as Arc<dyn LedgerTransport>,
        ledger_id,
    ))
}

/// Builds the full dashboard: transport, ledger client, and session.
async fn build_dashboard(connect: &ConnectArgs) -> Result<Dashboard> {
    let data_dir = expand_data_dir(&connect.data_dir);
    let session = session_manager(&data_dir)?;
    let client = ledger_client(connect).await?;
    Ok(Dashboard::new(client, session))
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

/// Signs in and persists the session, printing the resulting principal.
async fn login(connect: ConnectArgs) -> Result<()> {
    let dashboard = build_dashboard(&connect).await?;
    dashboard.startup().await;

    if let Some(principal) = dashboard.current_principal() {
        println!("Already signed in as {principal}");
        return Ok(());
    }

    match dashboard.login().await? {
        AuthOutcome::Authenticated(identity) => {
            println!("Signed in as {}", identity.principal);
            if let Some(expires_at) = identity.expires_at {
                println!("Session expires {}", expires_at.to_rfc3339());
            }
            if let Some(balance) = dashboard.state().display_balance() {
                println!("Balance: {balance}");
            }
        }
        AuthOutcome::Dismissed => println!("Login dismissed."),
    }
    Ok(())
}

/// Prints the signed-in principal from the persisted session. Never
/// touches the network: an expired or absent session just reads as
/// signed out.
fn whoami(connect: ConnectArgs) -> Result<()> {
    let data_dir = expand_data_dir(&connect.data_dir);
    let session = session_manager(&data_dir)?;

    match session.restore_session() {
        Some(identity) => {
            println!("{}", identity.principal);
            if let Some(expires_at) = identity.expires_at {
                let left = expires_at - chrono::Utc::now();
                println!("Session expires in {} minutes", left.num_minutes().max(0));
            }
        }
        None => println!("Not signed in. Run `zenith-wallet login`."),
    }
    Ok(())
}

/// Fetches and prints the ledger's token metadata.
async fn info(connect: ConnectArgs) -> Result<()> {
    let client = ledger_client(&connect).await?;
    let metadata = client.metadata().await.context("loading token metadata")?;

    println!("Token    : {} ({})", metadata.name, metadata.symbol);
    println!("Decimals : {}", metadata.decimals);
    println!("Fee      : {}", metadata.display_fee());
    println!(
        "Supply   : {}",
        metadata.display_with_symbol(metadata.total_supply)
    );
    Ok(())
}

/// Prints the balance of the signed-in identity, or of `--of` when given.
async fn balance(args: cli::BalanceArgs) -> Result<()> {
    let connect = &args.connect;
    let client = ledger_client(connect).await?;
    let metadata = client.metadata().await.context("loading token metadata")?;

    let owner: Principal = match &args.of {
        Some(text) => text
            .parse()
            .with_context(|| format!("invalid principal: {text}"))?,
        None => {
            let data_dir = expand_data_dir(&connect.data_dir);
            session_manager(&data_dir)?
                .restore_session()
                .map(|identity| identity.principal)
                .context("not signed in; run `zenith-wallet login` or pass --of")?
        }
    };

    let account = match &args.subaccount {
        Some(hex_text) => Account::new(owner, Some(Subaccount::from_hex(hex_text)?)),
        None => Account::default_of(owner),
    };

    let held = client.balance_of(&account).await?;
    println!("{}", metadata.display_with_symbol(held));
    Ok(())
}

/// Submits a transfer through the dashboard workflow and reports the
/// outcome. Validation failures and ledger declines both surface as
/// errors with the reason; only a recorded transfer prints a block index.
async fn transfer(args: cli::TransferArgs) -> Result<()> {
    let dashboard = build_dashboard(&args.connect).await?;
    dashboard.startup().await;

    if dashboard.current_principal().is_none() {
        anyhow::bail!("not signed in; run `zenith-wallet login` first");
    }
    if dashboard.state().metadata().is_none() {
        anyhow::bail!("token metadata is unavailable; check the gateway and ledger id");
    }

    let block = dashboard
        .submit_transfer(&args.to, &args.amount)
        .await
        .context("transfer not recorded")?;
    dashboard.acknowledge_transfer();

    println!("Transfer recorded at block {block}");
    if let Some(balance) = dashboard.state().display_balance() {
        println!("Balance: {balance}");
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("zenith-wallet {}", env!("CARGO_PKG_VERSION"));
    println!("client        {}", zenith_client::VERSION);
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

//! # CLI Interface
//!
//! Defines the command-line argument structure for `zenith-wallet` using
//! `clap` derive. Supports six subcommands: `login`, `whoami`, `info`,
//! `balance`, `transfer`, and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ZENITH command-line wallet.
///
/// A small wallet for ICRC-style token ledgers: signs in with a local
/// development identity, reads token metadata and balances, and submits
/// transfers through the same workflow the dashboard uses.
#[derive(Parser, Debug)]
#[command(
    name = "zenith-wallet",
    about = "ZENITH command-line wallet for ICRC-style token ledgers",
    version,
    propagate_version = true
)]
pub struct ZenithWalletCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the wallet binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with the local development identity and persist the session.
    Login(LoginArgs),
    /// Print the signed-in principal, without touching the network.
    Whoami(WhoamiArgs),
    /// Print the ledger's token metadata.
    Info(InfoArgs),
    /// Print an account balance.
    Balance(BalanceArgs),
    /// Submit a transfer and report its outcome.
    Transfer(TransferArgs),
    /// Print version information and exit.
    Version,
}

impl Commands {
    /// Connection arguments of the subcommand, if it takes any.
    pub fn connect(&self) -> Option<&ConnectArgs> {
        match self {
            Commands::Login(args) => Some(&args.connect),
            Commands::Whoami(args) => Some(&args.connect),
            Commands::Info(args) => Some(&args.connect),
            Commands::Balance(args) => Some(&args.connect),
            Commands::Transfer(args) => Some(&args.connect),
            Commands::Version => None,
        }
    }
}

/// Arguments shared by every subcommand that talks to a ledger or reads
/// the wallet data directory.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Network to talk to: mainnet, playground, or local.
    #[arg(long, env = "ZENITH_NETWORK", default_value = "local")]
    pub network: String,

    /// Ledger identifier in principal text form.
    #[arg(
        long,
        env = "ZENITH_LEDGER_ID",
        default_value = "ryjl3-tyaaa-aaaaa-aaaba-cai"
    )]
    pub ledger: String,

    /// Gateway URL override. Defaults to the selected network's gateway.
    #[arg(long, env = "ZENITH_GATEWAY")]
    pub gateway: Option<String>,

    /// Directory holding the wallet's key and session files.
    ///
    /// Created on first use if it does not exist.
    #[arg(long, short = 'd', env = "ZENITH_DATA_DIR", default_value = "~/.zenith")]
    pub data_dir: PathBuf,

    /// Log output format: pretty or json.
    #[arg(long, env = "ZENITH_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `login` subcommand.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

/// Arguments for the `whoami` subcommand.
#[derive(Parser, Debug)]
pub struct WhoamiArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

/// Arguments for the `info` subcommand.
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

/// Arguments for the `balance` subcommand.
#[derive(Parser, Debug)]
pub struct BalanceArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Account owner to query instead of the signed-in identity.
    #[arg(long)]
    pub of: Option<String>,

    /// Subaccount as 64 hex characters. Defaults to the default subaccount.
    #[arg(long)]
    pub subaccount: Option<String>,
}

/// Arguments for the `transfer` subcommand.
#[derive(Parser, Debug)]
pub struct TransferArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Recipient principal in text form.
    pub to: String,

    /// Amount in whole tokens, e.g. "1.5". Scaled by the ledger's
    /// decimals; excess fractional digits are truncated, never rounded.
    pub amount: String,
}

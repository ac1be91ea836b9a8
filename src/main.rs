//! Volume Bot - wallet generation and paced buy/sell cycles
//!
//! # WARNING
//! - Saved wallet batches contain private keys in plain JSON.
//! - The `run` command uses a simulated executor; it never sends transactions.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use volume_bot::cli::commands;
use volume_bot::config::Config;

/// Volume Bot - EVM wallet manager and trading cycle runner
#[derive(Parser)]
#[command(name = "volume-bot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "volume-bot.toml")]
    config: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one trading cycle over a saved wallet batch (simulated execution)
    Run {
        /// Batch file name inside the storage directory (default: latest)
        #[arg(long)]
        file: Option<String>,

        /// Treat every wallet as funded with its assigned amount
        #[arg(long)]
        fund_all: bool,

        /// Seed for pacing and simulated results
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show current configuration (secrets masked)
    Config,

    /// Wallet management commands
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
}

#[derive(Subcommand)]
enum WalletAction {
    /// Generate a batch of sub-wallets
    Generate {
        /// Number of wallets (default: wallets.count from config)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Save the batch to the storage directory
        #[arg(long)]
        save: bool,
    },

    /// List wallets from a saved batch
    List {
        /// Batch file name (default: latest)
        #[arg(long)]
        file: Option<String>,

        /// Also print private keys and mnemonics (asks for confirmation)
        #[arg(long)]
        reveal: bool,
    },

    /// Check an address string
    ValidateAddress {
        address: String,
    },

    /// Check a private key string
    ValidateKey {
        /// Private key; read from VOLUME_BOT_PRIVATE_KEY when omitted
        #[arg(env = "VOLUME_BOT_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },

    /// Refresh funded balances over RPC
    Balances {
        /// Batch file name (default: latest)
        #[arg(long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("volume_bot=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    }

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Run {
            file,
            fund_all,
            seed,
        } => commands::run(&config, file, fund_all, seed).await,
        Commands::Config => commands::show_config(&config),
        Commands::Wallet { action } => match action {
            WalletAction::Generate { count, save } => {
                commands::wallet_generate(&config, count, save).await
            }
            WalletAction::List { file, reveal } => {
                commands::wallet_list(&config, file, reveal).await
            }
            WalletAction::ValidateAddress { address } => {
                commands::wallet_validate_address(&address)
            }
            WalletAction::ValidateKey { private_key } => {
                commands::wallet_validate_key(&private_key)
            }
            WalletAction::Balances { file } => commands::wallet_balances(&config, file).await,
        },
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

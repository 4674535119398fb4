//! Wallet Risk Scorer - batch risk scores for lending-protocol users
//!
//! Reads a wallet list, pulls each wallet's history from Etherscan, keeps the
//! interactions with the protocol contract and writes a 0-1000 score per wallet.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

// Use the library crate
use wallet_risk_scorer::cli::commands::{self, ScoreOptions};
use wallet_risk_scorer::config::Config;

/// Wallet Risk Scorer - lending-protocol wallet risk scores
#[derive(Parser)]
#[command(name = "wallet-risk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every wallet in the wallet list
    Score {
        /// Wallet list CSV (path or http(s) URL)
        #[arg(long)]
        wallets: Option<String>,

        /// Maximum number of wallets to score
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output CSV for wallet_id,score
        #[arg(short, long)]
        output: Option<String>,

        /// Also write every feature and intermediate score to this CSV
        #[arg(long)]
        features_out: Option<String>,
    },

    /// Print the extracted features for one wallet
    Inspect {
        /// Wallet address
        address: String,
    },

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wallet_risk_scorer=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    // Load configuration; `config` only displays it, so it skips validation
    let loaded = match cli.command {
        Commands::Config => Config::load_unvalidated(&cli.config),
        _ => Config::load(&cli.config),
    };
    let config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded");

    // Execute command
    let result = match cli.command {
        Commands::Score {
            wallets,
            limit,
            output,
            features_out,
        } => {
            commands::score(
                &config,
                ScoreOptions {
                    wallets,
                    limit,
                    output,
                    features_out,
                },
            )
            .await
        }
        Commands::Inspect { address } => commands::inspect(&config, &address).await,
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

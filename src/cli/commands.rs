//! CLI command implementations

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::SystemClock;
use crate::config::Config;
use crate::fetch::EtherscanClient;
use crate::pipeline::RiskPipeline;
use crate::report;
use crate::wallets;

/// Overrides for the `score` command
#[derive(Debug, Default, Clone)]
pub struct ScoreOptions {
    pub wallets: Option<String>,
    pub limit: Option<usize>,
    pub output: Option<String>,
    pub features_out: Option<String>,
}

/// Score the wallet list and write the report(s)
pub async fn score(config: &Config, options: ScoreOptions) -> Result<()> {
    let mut config = config.clone();
    if let Some(source) = options.wallets {
        config.input.wallet_list = source;
    }
    if let Some(limit) = options.limit {
        config.input.max_wallets = limit;
    }
    if let Some(output) = options.output {
        config.output.scores_path = output;
    }
    if options.features_out.is_some() {
        config.output.features_path = options.features_out;
    }
    config.validate()?;

    info!("Starting wallet risk scoring...");
    info!(
        "Protocol contract: {}, rate limit: {} req/s",
        config.protocol.contract_address, config.etherscan.requests_per_second
    );

    // Load the wallet list before any per-wallet work
    let wallet_list = wallets::load_wallets(&config.input)
        .await
        .context("Error loading wallet addresses")?;

    let client = EtherscanClient::new(&config.etherscan)?;
    let pipeline = RiskPipeline::new(client, &config, Arc::new(SystemClock));

    let run = pipeline.run(&wallet_list).await;
    if run.inactive_count() == run.scored.len() {
        warn!("No wallet had any protocol interactions; all scores use the degenerate fallback");
    }

    report::write_scores(&config.output.scores_path, &run.score_records())?;
    info!("Wallet risk scores saved to {}", config.output.scores_path);

    if let Some(ref path) = config.output.features_path {
        report::write_feature_report(path, &run.scored)?;
        info!("Feature report saved to {}", path);
    }

    Ok(())
}

/// Fetch, filter and extract features for a single wallet, printed as JSON
pub async fn inspect(config: &Config, address: &str) -> Result<()> {
    let client = EtherscanClient::new(&config.etherscan)?;
    let pipeline = RiskPipeline::new(client, config, Arc::new(SystemClock));

    let features = pipeline.profile_wallet(address).await;
    println!("{}", serde_json::to_string_pretty(&features)?);
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

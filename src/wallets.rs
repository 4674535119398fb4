//! Wallet list loading
//!
//! The wallet list is a CSV with a header row; one column holds the wallet
//! addresses. It can live on disk or behind an http(s) URL (e.g. a published
//! spreadsheet export).

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::InputConfig;
use crate::error::{Error, Result};

/// Load up to `max_wallets` wallet addresses from the configured source
pub async fn load_wallets(config: &InputConfig) -> Result<Vec<String>> {
    let body = read_source(&config.wallet_list).await?;
    let wallets = parse_wallets(body.as_bytes(), &config.wallet_column, config.max_wallets)?;

    if wallets.is_empty() {
        return Err(Error::WalletList(format!(
            "no wallet addresses in column '{}'",
            config.wallet_column
        )));
    }

    info!(count = wallets.len(), "Loaded wallet list");
    Ok(wallets)
}

async fn read_source(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        debug!("Downloading wallet list");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::WalletList(format!("failed to create HTTP client: {}", e)))?;

        let response = client
            .get(source)
            .send()
            .await
            .map_err(|e| Error::WalletList(format!("download failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(Error::WalletList(format!(
                "download returned HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::WalletList(format!("failed to read body: {}", e.without_url())))
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| Error::WalletList(format!("cannot read {}: {}", source, e)))
    }
}

/// Parse wallet addresses from CSV, keeping input order
///
/// Only the first `limit` data rows are read; blank cells among them are skipped.
pub fn parse_wallets<R: std::io::Read>(reader: R, column: &str, limit: usize) -> Result<Vec<String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| Error::WalletList(format!("invalid CSV header: {}", e)))?;
    let index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| Error::WalletList(format!("column '{}' not found", column)))?;

    let mut wallets = Vec::new();
    for (row, record) in csv_reader.records().take(limit).enumerate() {
        let record = record.map_err(|e| Error::WalletList(format!("row {}: {}", row + 1, e)))?;
        match record.get(index) {
            Some(wallet) if !wallet.is_empty() => wallets.push(wallet.to_string()),
            _ => warn!(row = row + 1, "Skipping row without wallet address"),
        }
    }

    Ok(wallets)
}

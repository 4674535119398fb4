//! Configuration loading and validation

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

use crate::error::Error;

// Re-export scoring config
pub use crate::scoring::{ScoreWeights, ScoringConfig};

/// Environment variable holding the indexer API key when not set in config
pub const API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Slowest request rate accepted for the shared limiter
pub const MIN_REQUESTS_PER_SECOND: f64 = 0.01;

/// Compound V2 Comptroller on Ethereum mainnet
pub const COMPOUND_V2_COMPTROLLER: &str = "0x3d9819210A31b4961b30EF54bE2aeD79B9c9Cd3B";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub etherscan: EtherscanConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Indexing service connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct EtherscanConfig {
    /// API key (falls back to ETHERSCAN_API_KEY)
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Chain queried through the multichain endpoint (1 = Ethereum mainnet)
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Shared request budget across all wallets
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
    #[serde(default = "default_burst")]
    pub burst: u32,
    #[serde(default)]
    pub start_block: u64,
    #[serde(default = "default_end_block")]
    pub end_block: u64,
    #[serde(default = "default_retry_initial_ms")]
    pub retry_initial_ms: u64,
    /// Total retry budget per wallet; 0 disables retries
    #[serde(default = "default_retry_max_elapsed_ms")]
    pub retry_max_elapsed_ms: u64,
}

/// Target protocol and feature settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default = "default_contract_address")]
    pub contract_address: String,
    /// Decimals between the smallest unit and the display unit (18 for ETH)
    #[serde(default = "default_value_decimals")]
    pub value_decimals: u32,
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: u32,
}

/// Wallet list source
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Local CSV path or http(s) URL
    #[serde(default = "default_wallet_list")]
    pub wallet_list: String,
    #[serde(default = "default_wallet_column")]
    pub wallet_column: String,
    #[serde(default = "default_max_wallets")]
    pub max_wallets: usize,
}

/// Report destinations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_scores_path")]
    pub scores_path: String,
    /// Optional full feature report
    #[serde(default)]
    pub features_path: Option<String>,
}

fn default_base_url() -> String {
    "https://api.etherscan.io/v2/api".to_string()
}

fn default_chain_id() -> u64 {
    1
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_requests_per_second() -> f64 {
    5.0
}

fn default_burst() -> u32 {
    1
}

fn default_end_block() -> u64 {
    99_999_999
}

fn default_retry_initial_ms() -> u64 {
    500
}

fn default_retry_max_elapsed_ms() -> u64 {
    3_000
}

fn default_contract_address() -> String {
    COMPOUND_V2_COMPTROLLER.to_string()
}

fn default_value_decimals() -> u32 {
    18
}

fn default_recent_window_days() -> u32 {
    30
}

fn default_wallet_list() -> String {
    "https://docs.google.com/spreadsheets/d/1ZzaeMgNYnxvriYYpe8PE7uMEblTI0GV5GIVUnsP-sBs/export?format=csv"
        .to_string()
}

fn default_wallet_column() -> String {
    "wallet_id".to_string()
}

fn default_max_wallets() -> usize {
    100
}

fn default_scores_path() -> String {
    "wallet_risk_scores.csv".to_string()
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            chain_id: default_chain_id(),
            timeout_ms: default_timeout_ms(),
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
            start_block: 0,
            end_block: default_end_block(),
            retry_initial_ms: default_retry_initial_ms(),
            retry_max_elapsed_ms: default_retry_max_elapsed_ms(),
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            contract_address: default_contract_address(),
            value_decimals: default_value_decimals(),
            recent_window_days: default_recent_window_days(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            wallet_list: default_wallet_list(),
            wallet_column: default_wallet_column(),
            max_wallets: default_max_wallets(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            scores_path: default_scores_path(),
            features_path: None,
        }
    }
}

impl Config {
    /// Load and validate configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::load_unvalidated(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration without validating it (used to display settings)
    pub fn load_unvalidated<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("etherscan.base_url", default_base_url())?
            .set_default("etherscan.timeout_ms", default_timeout_ms() as i64)?
            .set_default("protocol.contract_address", default_contract_address())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix WALLET_RISK_)
            .add_source(
                config::Environment::with_prefix("WALLET_RISK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if config.etherscan.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                config.etherscan.api_key = key.trim().to_string();
            }
        }

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.etherscan.api_key.is_empty() {
            return Err(Error::MissingEnvVar(format!(
                "{} (Etherscan API key not found; set it in the environment, a .env file or etherscan.api_key)",
                API_KEY_ENV
            ))
            .into());
        }

        let address_re = Regex::new(r"^0x[0-9a-fA-F]{40}$").context("Invalid address pattern")?;
        if !address_re.is_match(&self.protocol.contract_address) {
            return Err(Error::InvalidAddress(self.protocol.contract_address.clone()).into());
        }

        let rps = self.etherscan.requests_per_second;
        if !rps.is_finite() || rps < MIN_REQUESTS_PER_SECOND {
            anyhow::bail!(
                "etherscan.requests_per_second must be at least {}, got {}",
                MIN_REQUESTS_PER_SECOND,
                rps
            );
        }

        if self.etherscan.timeout_ms == 0 {
            anyhow::bail!("etherscan.timeout_ms must be positive");
        }

        if self.etherscan.start_block > self.etherscan.end_block {
            anyhow::bail!(
                "etherscan.start_block ({}) is after end_block ({})",
                self.etherscan.start_block,
                self.etherscan.end_block
            );
        }

        if self.protocol.value_decimals > 36 {
            anyhow::bail!("protocol.value_decimals cannot exceed 36");
        }

        if self.input.max_wallets == 0 {
            anyhow::bail!("input.max_wallets must be positive");
        }

        if self.input.wallet_column.trim().is_empty() {
            anyhow::bail!("input.wallet_column cannot be empty");
        }

        // Validate scoring weights
        let weights = self.scoring.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            anyhow::bail!("scoring weights must be finite and non-negative");
        }
        let sum = self.scoring.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            anyhow::bail!("scoring weights must sum to 1.0, got {}", sum);
        }

        if !(0.0..=1000.0).contains(&self.scoring.degenerate_score) {
            anyhow::bail!("scoring.degenerate_score must be within [0, 1000]");
        }

        if self.etherscan.requests_per_second > 5.0 {
            tracing::warn!(
                "requests_per_second={} exceeds the free Etherscan tier (5/s)",
                self.etherscan.requests_per_second
            );
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Etherscan:
    base_url: {} (chain {})
    api_key: {}
    timeout: {}ms
    rate: {} req/s (burst {})
    blocks: {}..{}
    retry budget: {}ms
  Protocol:
    contract: {}
    value_decimals: {}
    recent_window: {} days
  Input:
    wallet_list: {}
    column: {}
    max_wallets: {}
  Output:
    scores: {}
    features: {}
  Scoring:
    weights: {:?}
    max_tx_count: {}
    max_failed_tx: {}
    degenerate_score: {}
"#,
            mask_url(&self.etherscan.base_url),
            self.etherscan.chain_id,
            if self.etherscan.api_key.is_empty() {
                "(not set)"
            } else {
                "***"
            },
            self.etherscan.timeout_ms,
            self.etherscan.requests_per_second,
            self.etherscan.burst,
            self.etherscan.start_block,
            self.etherscan.end_block,
            self.etherscan.retry_max_elapsed_ms,
            self.protocol.contract_address,
            self.protocol.value_decimals,
            self.protocol.recent_window_days,
            mask_url(&self.input.wallet_list),
            self.input.wallet_column,
            self.input.max_wallets,
            self.output.scores_path,
            self.output.features_path.as_deref().unwrap_or("(disabled)"),
            self.scoring.weights.as_array(),
            self.scoring.max_tx_count,
            self.scoring.max_failed_tx,
            self.scoring.degenerate_score,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

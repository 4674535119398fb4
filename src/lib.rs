//! Wallet Risk Scorer Library
//!
//! Batch risk scoring (0-1000) of wallets from their interactions with a
//! single lending-protocol contract.

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod features;
pub mod fetch;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod types;
pub mod wallets;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{RiskPipeline, RunReport};
pub use types::{FeatureRecord, ScoreRecord, ScoredWallet, Transaction};

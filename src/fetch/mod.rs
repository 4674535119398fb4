//! Transaction fetching from the indexing service
//!
//! Fetching never fails from the caller's point of view: any upstream problem
//! is logged and the wallet is treated as having no history.

pub mod etherscan;
pub mod rate_limit;

use async_trait::async_trait;

use crate::types::Transaction;

pub use etherscan::{EtherscanClient, FetchOutcome};
pub use rate_limit::RateLimiter;

/// Source of per-wallet transaction history
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// All transactions for `address` in ascending block order; empty on any failure
    async fn fetch_transactions(&self, address: &str) -> Vec<Transaction>;
}

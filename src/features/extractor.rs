//! Feature extraction
//!
//! Turns a wallet's protocol transactions into a fixed-width [`FeatureRecord`]:
//! - Activity volume (tx count, total and average value)
//! - Failure count
//! - Recency (share of transactions inside the trailing window)
//! - Counterparty breadth

use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::ProtocolConfig;
use crate::types::{FeatureRecord, Transaction};

/// Feature extractor with an injected clock
pub struct FeatureExtractor {
    /// Smallest unit -> display unit divisor (10^decimals)
    unit_divisor: f64,
    recent_window: Duration,
    clock: Arc<dyn Clock>,
}

impl FeatureExtractor {
    /// Create an extractor from protocol settings
    pub fn new(config: &ProtocolConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            unit_divisor: 10f64.powi(config.value_decimals as i32),
            recent_window: Duration::days(config.recent_window_days as i64),
            clock,
        }
    }

    /// Build the feature record for one wallet
    pub fn extract(&self, wallet: &str, transactions: &[Transaction]) -> FeatureRecord {
        if transactions.is_empty() {
            return FeatureRecord::empty(wallet);
        }

        let tx_count = transactions.len() as u64;
        let total_value: f64 = transactions
            .iter()
            .map(|tx| tx.value as f64 / self.unit_divisor)
            .sum();
        let failed_tx_count = transactions.iter().filter(|tx| tx.is_error).count() as u64;

        let now = self.clock.now().timestamp();
        let window_secs = self.recent_window.num_seconds();
        let recent = transactions
            .iter()
            .filter(|tx| now.saturating_sub(tx.timestamp) < window_secs)
            .count();

        let counterparties: HashSet<String> = transactions
            .iter()
            .flat_map(|tx| [tx.to.to_lowercase(), tx.from.to_lowercase()])
            .collect();

        FeatureRecord {
            wallet_id: wallet.to_string(),
            tx_count,
            total_value,
            avg_value: total_value / tx_count as f64,
            failed_tx_count,
            recent_activity_ratio: recent as f64 / tx_count as f64,
            unique_counterparty_count: counterparties.len() as u64,
        }
    }
}

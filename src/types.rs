//! Shared data structures for the scoring pipeline

use serde::{Deserialize, Serialize};

/// A single on-chain transaction as reported by the indexing service
///
/// Only the fields the feature extractor reads are kept; everything else in
/// the indexer payload is dropped at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub block_number: u64,
    pub from: String,
    /// Empty for contract-creation transactions
    pub to: String,
    /// Value in the smallest currency unit (wei)
    pub value: u128,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    pub is_error: bool,
}

/// Behavioral features for one wallet, derived from its protocol transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub wallet_id: String,
    pub tx_count: u64,
    /// Sum of transaction values in display units (ETH)
    pub total_value: f64,
    pub avg_value: f64,
    pub failed_tx_count: u64,
    /// Share of transactions inside the recent-activity window (0.0 to 1.0)
    pub recent_activity_ratio: f64,
    pub unique_counterparty_count: u64,
}

impl FeatureRecord {
    /// All-zero record for a wallet with no relevant activity
    pub fn empty(wallet_id: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            tx_count: 0,
            total_value: 0.0,
            avg_value: 0.0,
            failed_tx_count: 0,
            recent_activity_ratio: 0.0,
            unique_counterparty_count: 0,
        }
    }

    /// True when the wallet had no protocol interactions at all
    pub fn is_empty(&self) -> bool {
        self.tx_count == 0
    }
}

/// A feature record augmented with the scorer's derived fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredWallet {
    pub features: FeatureRecord,

    // Inverse features (higher = less risky)
    pub inv_tx_count: f64,
    pub inv_avg_value: f64,
    pub inv_failed_tx: f64,

    /// Unnormalized weighted sum
    pub raw_score: f64,
    /// Bot / high-risk override applied
    pub is_high_risk: bool,
    /// Final score in [0, 1000]
    pub score: f64,
}

impl ScoredWallet {
    pub fn wallet_id(&self) -> &str {
        &self.features.wallet_id
    }

    pub fn to_score_record(&self) -> ScoreRecord {
        ScoreRecord {
            wallet_id: self.features.wallet_id.clone(),
            score: self.score,
        }
    }
}

/// Final output row: one per input wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub wallet_id: String,
    pub score: f64,
}

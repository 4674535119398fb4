//! Risk scoring engine
//!
//! Scores the whole wallet population at once:
//! 1. Inverse features penalize thin activity, concentrated value and failures
//! 2. A fixed weighted sum gives each wallet a raw score
//! 3. Raw scores are min-max scaled into [0, 1000] across the population
//! 4. Bot-like wallets (too many transactions or failures) are forced to 0

pub mod normalize;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{FeatureRecord, ScoredWallet};

pub use normalize::{min_max_scale, SCORE_MAX, SCORE_MIN};

/// Weights of the six scored features (must sum to 1.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_weight_inv_tx_count")]
    pub inv_tx_count: f64,
    #[serde(default = "default_weight_total_value")]
    pub total_value: f64,
    #[serde(default = "default_weight_inv_avg_value")]
    pub inv_avg_value: f64,
    #[serde(default = "default_weight_inv_failed_tx")]
    pub inv_failed_tx: f64,
    #[serde(default = "default_weight_recent_activity")]
    pub recent_activity_ratio: f64,
    #[serde(default = "default_weight_counterparties")]
    pub unique_counterparty_count: f64,
}

fn default_weight_inv_tx_count() -> f64 { 0.20 }
fn default_weight_total_value() -> f64 { 0.30 }
fn default_weight_inv_avg_value() -> f64 { 0.10 }
fn default_weight_inv_failed_tx() -> f64 { 0.30 }
fn default_weight_recent_activity() -> f64 { 0.05 }
fn default_weight_counterparties() -> f64 { 0.05 }

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            inv_tx_count: default_weight_inv_tx_count(),
            total_value: default_weight_total_value(),
            inv_avg_value: default_weight_inv_avg_value(),
            inv_failed_tx: default_weight_inv_failed_tx(),
            recent_activity_ratio: default_weight_recent_activity(),
            unique_counterparty_count: default_weight_counterparties(),
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.inv_tx_count,
            self.total_value,
            self.inv_avg_value,
            self.inv_failed_tx,
            self.recent_activity_ratio,
            self.unique_counterparty_count,
        ]
    }
}

/// Scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    /// Wallets with more protocol transactions than this are treated as bots
    #[serde(default = "default_max_tx_count")]
    pub max_tx_count: u64,

    /// Wallets with more failed transactions than this are treated as high risk
    #[serde(default = "default_max_failed_tx")]
    pub max_failed_tx: u64,

    /// Score given to every wallet when all raw scores are equal
    #[serde(default)]
    pub degenerate_score: f64,
}

fn default_max_tx_count() -> u64 {
    500
}

fn default_max_failed_tx() -> u64 {
    10
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            max_tx_count: default_max_tx_count(),
            max_failed_tx: default_max_failed_tx(),
            degenerate_score: 0.0,
        }
    }
}

/// Population-wide risk scorer
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Unnormalized weighted score for one wallet, with its inverse features
    pub fn raw_score(&self, features: &FeatureRecord) -> (f64, [f64; 3]) {
        let w = &self.config.weights;

        let inv_tx_count = 1.0 / (features.tx_count as f64 + 1.0);
        let inv_avg_value = 1.0 / (features.avg_value + 1.0);
        let inv_failed_tx = 1.0 / (features.failed_tx_count as f64 + 1.0);

        let raw = inv_tx_count * w.inv_tx_count
            + features.total_value * w.total_value
            + inv_avg_value * w.inv_avg_value
            + inv_failed_tx * w.inv_failed_tx
            + features.recent_activity_ratio * w.recent_activity_ratio
            + features.unique_counterparty_count as f64 * w.unique_counterparty_count;

        (raw, [inv_tx_count, inv_avg_value, inv_failed_tx])
    }

    /// Check the bot / high-risk override rule
    pub fn is_high_risk(&self, features: &FeatureRecord) -> bool {
        features.tx_count > self.config.max_tx_count
            || features.failed_tx_count > self.config.max_failed_tx
    }

    /// Score the whole population; output order matches input order
    pub fn score(&self, population: Vec<FeatureRecord>) -> Vec<ScoredWallet> {
        let partial: Vec<(FeatureRecord, f64, [f64; 3])> = population
            .into_iter()
            .map(|features| {
                let (raw, inverse) = self.raw_score(&features);
                (features, raw, inverse)
            })
            .collect();

        let raw_scores: Vec<f64> = partial.iter().map(|(_, raw, _)| *raw).collect();
        let scaled = min_max_scale(&raw_scores, self.config.degenerate_score);

        partial
            .into_iter()
            .zip(scaled)
            .map(|((features, raw_score, [inv_tx_count, inv_avg_value, inv_failed_tx]), scaled)| {
                let is_high_risk = self.is_high_risk(&features);
                if is_high_risk {
                    debug!(
                        wallet = %features.wallet_id,
                        tx_count = features.tx_count,
                        failed = features.failed_tx_count,
                        "High-risk override, score forced to 0"
                    );
                }

                ScoredWallet {
                    inv_tx_count,
                    inv_avg_value,
                    inv_failed_tx,
                    raw_score,
                    is_high_risk,
                    score: if is_high_risk { SCORE_MIN } else { scaled },
                    features,
                }
            })
            .collect()
    }
}

//! Batch scoring pipeline
//!
//! For each wallet: fetch → protocol filter → feature extraction. All feature
//! records are collected before the scorer runs, since min-max scaling needs
//! the whole population.

use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::Config;
use crate::features::{filter_protocol_transactions, FeatureExtractor};
use crate::fetch::TransactionSource;
use crate::scoring::RiskScorer;
use crate::types::{FeatureRecord, ScoreRecord, ScoredWallet};

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One entry per input wallet, in input order
    pub scored: Vec<ScoredWallet>,
}

impl RunReport {
    pub fn score_records(&self) -> Vec<ScoreRecord> {
        self.scored.iter().map(ScoredWallet::to_score_record).collect()
    }

    pub fn high_risk_count(&self) -> usize {
        self.scored.iter().filter(|s| s.is_high_risk).count()
    }

    /// Wallets with no protocol interactions
    pub fn inactive_count(&self) -> usize {
        self.scored.iter().filter(|s| s.features.is_empty()).count()
    }
}

/// Fetch → filter → extract → score
pub struct RiskPipeline<S: TransactionSource> {
    source: S,
    extractor: FeatureExtractor,
    scorer: RiskScorer,
    contract: String,
}

impl<S: TransactionSource> RiskPipeline<S> {
    pub fn new(source: S, config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            extractor: FeatureExtractor::new(&config.protocol, clock),
            scorer: RiskScorer::new(config.scoring.clone()),
            contract: config.protocol.contract_address.clone(),
        }
    }

    /// Features for a single wallet; never fails
    pub async fn profile_wallet(&self, wallet: &str) -> FeatureRecord {
        let transactions = self.source.fetch_transactions(wallet).await;
        let relevant = filter_protocol_transactions(&transactions, &self.contract);
        debug!(
            wallet = %wallet,
            total = transactions.len(),
            relevant = relevant.len(),
            "Filtered protocol transactions"
        );
        self.extractor.extract(wallet, &relevant)
    }

    /// Features for every wallet, one record per input entry, in order
    pub async fn collect_features(&self, wallets: &[String]) -> Vec<FeatureRecord> {
        let total = wallets.len();
        let mut records = Vec::with_capacity(total);

        for (i, wallet) in wallets.iter().enumerate() {
            info!("Processing wallet {}/{}: {}", i + 1, total, wallet);
            records.push(self.profile_wallet(wallet).await);
        }

        records
    }

    /// Score the whole wallet list
    pub async fn run(&self, wallets: &[String]) -> RunReport {
        let features = self.collect_features(wallets).await;
        let scored = self.scorer.score(features);

        let report = RunReport { scored };
        info!(
            wallets = report.scored.len(),
            high_risk = report.high_risk_count(),
            inactive = report.inactive_count(),
            "Scoring complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::COMPOUND_V2_COMPTROLLER;
    use crate::types::Transaction;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NOW: i64 = 1_750_000_000;
    const DAY: i64 = 86_400;
    const ONE_ETH: u128 = 1_000_000_000_000_000_000;

    struct FakeSource {
        histories: HashMap<String, Vec<Transaction>>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(histories: HashMap<String, Vec<Transaction>>) -> Self {
            Self {
                histories,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TransactionSource for FakeSource {
        async fn fetch_transactions(&self, address: &str) -> Vec<Transaction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.histories.get(address).cloned().unwrap_or_default()
        }
    }

    fn tx(wallet: &str, to: &str, value: u128, age_days: i64, is_error: bool) -> Transaction {
        Transaction {
            hash: String::new(),
            block_number: 0,
            from: wallet.to_string(),
            to: to.to_string(),
            value,
            timestamp: NOW - age_days * DAY,
            is_error,
        }
    }

    fn pipeline(histories: HashMap<String, Vec<Transaction>>) -> RiskPipeline<FakeSource> {
        let mut config = Config::default();
        config.etherscan.api_key = "test".to_string();
        RiskPipeline::new(
            FakeSource::new(histories),
            &config,
            Arc::new(FixedClock::at_timestamp(NOW)),
        )
    }

    fn wallets(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_end_to_end_scoring() {
        let contract = COMPOUND_V2_COMPTROLLER.to_lowercase();
        let mut histories = HashMap::new();
        // A: only unrelated activity
        histories.insert("A".to_string(), vec![tx("A", "0xdex", ONE_ETH, 1, false)]);
        // B: five recent successful 1.0 ETH protocol calls
        histories.insert(
            "B".to_string(),
            (0..5).map(|d| tx("B", &contract, ONE_ETH, d, false)).collect(),
        );
        // C: bot-like volume
        histories.insert(
            "C".to_string(),
            (0..600).map(|_| tx("C", &contract, 0, 100, false)).collect(),
        );

        let pipeline = pipeline(histories);
        let report = pipeline.run(&wallets(&["A", "B", "C"])).await;
        let by_id: HashMap<&str, &ScoredWallet> =
            report.scored.iter().map(|s| (s.wallet_id(), s)).collect();

        let a = by_id["A"];
        assert_eq!(a.features, FeatureRecord::empty("A"));
        assert!(a.score < 500.0);

        let b = by_id["B"];
        assert_eq!(b.features.tx_count, 5);
        assert!((b.features.total_value - 5.0).abs() < 1e-9);
        assert_eq!(b.features.recent_activity_ratio, 1.0);
        assert!(b.score > 500.0);

        let c = by_id["C"];
        assert!(c.is_high_risk);
        assert_eq!(c.score, 0.0);

        assert_eq!(report.high_risk_count(), 1);
        assert_eq!(report.inactive_count(), 1);
    }

    #[tokio::test]
    async fn test_every_wallet_gets_one_score() {
        let pipeline = pipeline(HashMap::new());
        let input = wallets(&["0x1", "0x2", "0x3", "0x4"]);

        let records = pipeline.run(&input).await.score_records();

        assert_eq!(records.len(), input.len());
        let out: HashSet<&str> = records.iter().map(|r| r.wallet_id.as_str()).collect();
        let expected: HashSet<&str> = input.iter().map(String::as_str).collect();
        assert_eq!(out, expected);
        assert!(records.iter().all(|r| (0.0..=1000.0).contains(&r.score)));
        assert_eq!(pipeline.source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_wallet_list() {
        let report = pipeline(HashMap::new()).run(&[]).await;
        assert!(report.scored.is_empty());
    }
}

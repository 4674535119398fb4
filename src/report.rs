//! CSV reports written at the end of a run

use serde::Serialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{ScoreRecord, ScoredWallet};

/// Flat row of the feature report
#[derive(Debug, Serialize)]
struct FeatureReportRow<'a> {
    wallet_id: &'a str,
    tx_count: u64,
    total_value: f64,
    avg_value: f64,
    failed_tx_count: u64,
    recent_activity_ratio: f64,
    unique_counterparty_count: u64,
    inv_tx_count: f64,
    inv_avg_value: f64,
    inv_failed_tx: f64,
    raw_score: f64,
    is_high_risk: bool,
    score: f64,
}

impl<'a> From<&'a ScoredWallet> for FeatureReportRow<'a> {
    fn from(s: &'a ScoredWallet) -> Self {
        Self {
            wallet_id: &s.features.wallet_id,
            tx_count: s.features.tx_count,
            total_value: s.features.total_value,
            avg_value: s.features.avg_value,
            failed_tx_count: s.features.failed_tx_count,
            recent_activity_ratio: s.features.recent_activity_ratio,
            unique_counterparty_count: s.features.unique_counterparty_count,
            inv_tx_count: s.inv_tx_count,
            inv_avg_value: s.inv_avg_value,
            inv_failed_tx: s.inv_failed_tx,
            raw_score: s.raw_score,
            is_high_risk: s.is_high_risk,
            score: s.score,
        }
    }
}

/// Write `wallet_id,score` rows (no index column)
pub fn write_scores<P: AsRef<Path>>(path: P, scores: &[ScoreRecord]) -> Result<()> {
    write_rows(path.as_ref(), scores.iter())
}

/// Write every feature and derived scoring field per wallet
pub fn write_feature_report<P: AsRef<Path>>(path: P, scored: &[ScoredWallet]) -> Result<()> {
    write_rows(path.as_ref(), scored.iter().map(FeatureReportRow::from))
}

fn write_rows<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<()> {
    let report_err = |e: csv::Error| Error::Report(format!("{}: {}", path.display(), e));

    let mut writer = csv::Writer::from_path(path).map_err(report_err)?;
    for row in rows {
        writer.serialize(row).map_err(report_err)?;
    }
    writer
        .flush()
        .map_err(|e| Error::Report(format!("{}: {}", path.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeatureRecord;

    #[test]
    fn test_write_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        let scores = vec![
            ScoreRecord { wallet_id: "0xa".into(), score: 0.0 },
            ScoreRecord { wallet_id: "0xb".into(), score: 1000.0 },
            ScoreRecord { wallet_id: "0xc".into(), score: 412.5 },
        ];

        write_scores(&path, &scores).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "wallet_id,score");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "0xb,1000.0");

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let back: Vec<ScoreRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(back, scores);
    }

    #[test]
    fn test_write_feature_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.csv");
        let scored = vec![ScoredWallet {
            features: FeatureRecord::empty("0xa"),
            inv_tx_count: 1.0,
            inv_avg_value: 1.0,
            inv_failed_tx: 1.0,
            raw_score: 0.6,
            is_high_risk: false,
            score: 0.0,
        }];

        write_feature_report(&path, &scored).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let header = written.lines().next().unwrap();
        assert!(header.starts_with("wallet_id,tx_count,total_value"));
        assert!(header.ends_with("raw_score,is_high_risk,score"));
    }

    #[test]
    fn test_unwritable_path() {
        let err = write_scores("/nonexistent/dir/scores.csv", &[]).unwrap_err();
        assert!(matches!(err, Error::Report(_)));
    }
}

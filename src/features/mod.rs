//! Per-wallet feature derivation
//!
//! Protocol filtering followed by feature extraction.

pub mod extractor;
pub mod protocol_filter;

pub use extractor::FeatureExtractor;
pub use protocol_filter::{filter_protocol_transactions, touches_contract};

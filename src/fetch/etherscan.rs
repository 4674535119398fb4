//! Etherscan API client for wallet transaction history
//!
//! Provides access to:
//! - Normal transaction list for an address (`module=account&action=txlist`)
//!
//! Every request passes through the shared [`RateLimiter`]; transient failures
//! are retried with exponential backoff before the wallet degrades to an
//! empty history.

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::EtherscanConfig;
use crate::error::{Error, Result};
use crate::fetch::rate_limit::RateLimiter;
use crate::fetch::TransactionSource;
use crate::types::Transaction;

/// Outcome of a successful round-trip to the indexer
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The indexer returned the wallet's transactions
    Transactions(Vec<Transaction>),
    /// The indexer explicitly reported no activity for the address
    NoData,
}

impl FetchOutcome {
    pub fn into_transactions(self) -> Vec<Transaction> {
        match self {
            FetchOutcome::Transactions(txs) => txs,
            FetchOutcome::NoData => Vec::new(),
        }
    }
}

/// Etherscan API client
pub struct EtherscanClient {
    /// HTTP client
    client: Client,
    /// API key
    api_key: String,
    /// Base URL for the REST API
    base_url: String,
    chain_id: String,
    start_block: u64,
    end_block: u64,
    /// Request timeout
    timeout: Duration,
    retry_initial: Duration,
    retry_max_elapsed: Duration,
    limiter: RateLimiter,
}

impl EtherscanClient {
    /// Create a new client; every request it makes shares one rate limiter
    pub fn new(config: &EtherscanConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            chain_id: config.chain_id.to_string(),
            start_block: config.start_block,
            end_block: config.end_block,
            timeout,
            retry_initial: Duration::from_millis(config.retry_initial_ms),
            retry_max_elapsed: Duration::from_millis(config.retry_max_elapsed_ms),
            limiter: RateLimiter::new(config.requests_per_second, config.burst),
        })
    }

    /// Fetch the full transaction list for an address, retrying transient failures
    pub async fn fetch_history(&self, address: &str) -> Result<FetchOutcome> {
        let backoff = ExponentialBackoff {
            initial_interval: self.retry_initial,
            max_interval: self.retry_initial * 4,
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..Default::default()
        };

        retry(backoff, move || async move {
            self.limiter.acquire().await;
            match self.fetch_once(address).await {
                Ok(outcome) => Ok(outcome),
                Err(e) if e.is_retryable() => {
                    debug!(wallet = %address, "Retryable indexer error: {}", e);
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }

    /// Single request, no retry
    async fn fetch_once(&self, address: &str) -> Result<FetchOutcome> {
        debug!(wallet = %address, "Fetching transaction list");

        let start_block = self.start_block.to_string();
        let end_block = self.end_block.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("chainid", self.chain_id.as_str()),
                ("module", "account"),
                ("action", "txlist"),
                ("address", address),
                ("startblock", start_block.as_str()),
                ("endblock", end_block.as_str()),
                ("sort", "asc"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::HttpTimeout(self.timeout.as_millis() as u64)
                } else {
                    Error::Http(format!("Etherscan request failed: {}", e.without_url()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("Failed to read Etherscan response: {}", e.without_url())))?;

        parse_response(&body)
    }
}

#[async_trait]
impl TransactionSource for EtherscanClient {
    async fn fetch_transactions(&self, address: &str) -> Vec<Transaction> {
        match self.fetch_history(address).await {
            Ok(FetchOutcome::Transactions(txs)) => {
                debug!(wallet = %address, count = txs.len(), "Fetched transactions");
                txs
            }
            Ok(FetchOutcome::NoData) => {
                info!(wallet = %address, "No transactions found");
                Vec::new()
            }
            Err(e) => {
                warn!(wallet = %address, "Error fetching transactions: {}", e);
                Vec::new()
            }
        }
    }
}

/// Parse an Etherscan `txlist` response body
pub fn parse_response(body: &str) -> Result<FetchOutcome> {
    let envelope: EtherscanResponse = serde_json::from_str(body)
        .map_err(|e| Error::Deserialization(format!("Failed to parse Etherscan response: {}", e)))?;

    if envelope.status != "1" {
        let detail = match &envelope.result {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if envelope.message.starts_with("No transactions found") {
            return Ok(FetchOutcome::NoData);
        }
        if detail.to_ascii_lowercase().contains("rate limit") {
            return Err(Error::RateLimited(detail));
        }
        return Err(Error::Api {
            message: envelope.message,
            detail,
        });
    }

    let entries = match envelope.result {
        serde_json::Value::Array(entries) => entries,
        other => {
            return Err(Error::Deserialization(format!(
                "Expected transaction array, got {}",
                other
            )))
        }
    };

    let mut transactions = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<EtherscanTransaction>(entry)
            .map_err(|e| Error::Deserialization(e.to_string()))
            .and_then(Transaction::try_from)
        {
            Ok(tx) => transactions.push(tx),
            Err(e) => warn!("Skipping malformed transaction: {}", e),
        }
    }

    Ok(FetchOutcome::Transactions(transactions))
}

// ============ Etherscan API Response Types ============
// Etherscan encodes every numeric field as a decimal string

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct EtherscanTransaction {
    #[serde(default)]
    hash: String,
    #[serde(rename = "blockNumber", default)]
    block_number: String,
    #[serde(rename = "timeStamp")]
    time_stamp: String,
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    value: String,
    #[serde(rename = "isError", default)]
    is_error: String,
}

impl TryFrom<EtherscanTransaction> for Transaction {
    type Error = Error;

    fn try_from(raw: EtherscanTransaction) -> Result<Self> {
        let value = raw
            .value
            .parse::<u128>()
            .map_err(|e| Error::Deserialization(format!("value {:?}: {}", raw.value, e)))?;
        let timestamp = raw
            .time_stamp
            .parse::<i64>()
            .map_err(|e| Error::Deserialization(format!("timeStamp {:?}: {}", raw.time_stamp, e)))?;

        Ok(Transaction {
            hash: raw.hash,
            block_number: raw.block_number.parse().unwrap_or(0),
            from: raw.from,
            to: raw.to,
            value,
            timestamp,
            is_error: raw.is_error == "1",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    const ONE_TX_BODY: &str = r#"{"status":"1","message":"OK","result":[
        {"timeStamp":"1641000000","value":"1","from":"0xwallet","to":"0x3d9819210a31b4961b30ef54be2aed79b9c9cd3b"}
    ]}"#;

    /// Local HTTP responder: the n-th connection gets `responses[n]` (the last
    /// entry repeats); every request line is recorded.
    struct TestIndexer {
        url: String,
        hits: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl TestIndexer {
        async fn start(responses: Vec<(u16, &'static str)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let hits = Arc::new(AtomicUsize::new(0));
            let requests = Arc::new(Mutex::new(Vec::new()));

            let (counter, log) = (hits.clone(), requests.clone());
            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    let (status, body) = responses[n.min(responses.len() - 1)];

                    let mut buf = vec![0u8; 8192];
                    let read = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..read]);
                    log.lock()
                        .unwrap()
                        .push(request.lines().next().unwrap_or_default().to_string());

                    let reply = format!(
                        "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });

            Self {
                url: format!("http://{}/v2/api", addr),
                hits,
                requests,
            }
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        fn client(&self, retry_max_elapsed_ms: u64) -> EtherscanClient {
            let config = EtherscanConfig {
                api_key: "test".to_string(),
                base_url: self.url.clone(),
                timeout_ms: 2_000,
                retry_initial_ms: 50,
                retry_max_elapsed_ms,
                ..EtherscanConfig::default()
            };
            EtherscanClient::new(&config).unwrap()
        }
    }

    const OK_BODY: &str = r#"{
        "status": "1",
        "message": "OK",
        "result": [
            {
                "blockNumber": "14000000",
                "timeStamp": "1641000000",
                "hash": "0xaaa",
                "from": "0xWallet",
                "to": "0x3d9819210a31b4961b30ef54be2aed79b9c9cd3b",
                "value": "1500000000000000000",
                "isError": "0",
                "gasUsed": "21000"
            },
            {
                "blockNumber": "14000001",
                "timeStamp": "1641000100",
                "hash": "0xbbb",
                "from": "0xWallet",
                "to": "",
                "value": "0",
                "isError": "1"
            }
        ]
    }"#;

    #[test]
    fn test_parse_transactions() {
        let outcome = parse_response(OK_BODY).unwrap();
        let txs = outcome.into_transactions();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].block_number, 14_000_000);
        assert_eq!(txs[0].value, 1_500_000_000_000_000_000);
        assert_eq!(txs[0].timestamp, 1_641_000_000);
        assert!(!txs[0].is_error);
        assert!(txs[1].is_error);
        assert_eq!(txs[1].to, "");
    }

    #[test]
    fn test_no_transactions_is_not_an_error() {
        let body = r#"{"status":"0","message":"No transactions found","result":[]}"#;
        assert_eq!(parse_response(body).unwrap(), FetchOutcome::NoData);
    }

    #[test]
    fn test_api_error() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        match parse_response(body) {
            Err(Error::Api { message, detail }) => {
                assert_eq!(message, "NOTOK");
                assert_eq!(detail, "Invalid API Key");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_malformed_entry_skipped() {
        let body = r#"{"status":"1","message":"OK","result":[
            {"timeStamp":"abc","value":"1","from":"0x1","to":"0x2"},
            {"timeStamp":"10","value":"1","from":"0x1","to":"0x2"}
        ]}"#;
        let txs = parse_response(body).unwrap().into_transactions();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].timestamp, 10);
    }

    #[test]
    fn test_garbage_body() {
        assert!(matches!(
            parse_response("<html>502</html>"),
            Err(Error::Deserialization(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_indexer_degrades_to_empty() {
        let config = EtherscanConfig {
            api_key: "test".to_string(),
            base_url: "http://127.0.0.1:9/api".to_string(),
            timeout_ms: 500,
            retry_max_elapsed_ms: 0,
            ..EtherscanConfig::default()
        };
        let client = EtherscanClient::new(&config).unwrap();
        let txs = client.fetch_transactions("0xabc").await;
        assert!(txs.is_empty());
    }

    #[tokio::test]
    async fn test_transient_status_is_retried() {
        let indexer = TestIndexer::start(vec![(503, "busy"), (200, ONE_TX_BODY)]).await;
        let client = indexer.client(5_000);
        let start = Instant::now();

        let txs = client.fetch_history("0xWallet").await.unwrap().into_transactions();

        assert_eq!(indexer.hits(), 2);
        assert_eq!(txs.len(), 1);
        // The retry also waits for a limiter token (5 req/s)
        assert!(start.elapsed() >= Duration::from_millis(200));

        let requests = indexer.requests.lock().unwrap().clone();
        assert!(requests[0].starts_with("GET /v2/api?chainid=1&module=account&action=txlist"));
        assert!(requests[0].contains("address=0xWallet"));
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        let indexer = TestIndexer::start(vec![(200, body)]).await;
        let err = indexer.client(5_000).fetch_history("0xabc").await.unwrap_err();
        assert!(matches!(err, Error::Api { .. }));
        assert_eq!(indexer.hits(), 1);

        let indexer = TestIndexer::start(vec![(404, "not found")]).await;
        let err = indexer.client(5_000).fetch_history("0xabc").await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
        assert_eq!(indexer.hits(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_degrade_to_empty() {
        let indexer = TestIndexer::start(vec![(429, "slow down")]).await;
        let txs = indexer.client(300).fetch_transactions("0xabc").await;
        assert!(txs.is_empty());
        assert!(indexer.hits() >= 2);
    }
}

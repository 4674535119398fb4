//! Error types for the wallet risk scorer

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the wallet risk scorer
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // Indexing service errors
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP timeout after {0}ms")]
    HttpTimeout(u64),

    #[error("Indexer returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Indexer API error: {message} ({detail})")]
    Api { message: String, detail: String },

    #[error("Indexer rate limit reached: {0}")]
    RateLimited(String),

    // Input / output errors
    #[error("Wallet list error: {0}")]
    WalletList(String),

    #[error("Report write failed: {0}")]
    Report(String),

    // Response decoding
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::HttpTimeout(_) | Error::RateLimited(_) => true,
            Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

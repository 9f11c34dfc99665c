//! Centralized error types for the governance indexer

use thiserror::Error;

/// Main indexer error type
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Contract read {method} failed: {reason}")]
    ContractRead {
        method: &'static str,
        reason: String,
    },

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Content gateway error: {0}")]
    Content(String),

    #[error("Invalid proposal draft: {0}")]
    InvalidDraft(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Network-specific errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Log query for blocks {from}..={to} failed: {reason}")]
    LogWindow { from: u64, to: u64, reason: String },

    #[error("Timeout after {0:?}")]
    Timeout(std::time::Duration),
}

/// Result type alias for indexer operations
pub type IndexerResult<T> = Result<T, IndexerError>;

impl IndexerError {
    /// Shorthand for a failed precondition
    pub fn missing(what: impl Into<String>) -> Self {
        IndexerError::MissingPrerequisite(what.into())
    }
}

impl From<serde_json::Error> for IndexerError {
    fn from(err: serde_json::Error) -> Self {
        IndexerError::Serialization(err.to_string())
    }
}

impl From<alloy_sol_types::Error> for IndexerError {
    fn from(err: alloy_sol_types::Error) -> Self {
        IndexerError::Decode(err.to_string())
    }
}

impl From<::config::ConfigError> for IndexerError {
    fn from(err: ::config::ConfigError) -> Self {
        IndexerError::Configuration(err.to_string())
    }
}

impl From<validator::ValidationErrors> for IndexerError {
    fn from(err: validator::ValidationErrors) -> Self {
        IndexerError::Configuration(err.to_string())
    }
}

impl From<ureq::Error> for NetworkError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => NetworkError::Rpc {
                code: i64::from(code),
                message: response.status_text().to_string(),
            },
            ureq::Error::Transport(transport) => {
                NetworkError::ConnectionFailed(transport.to_string())
            }
        }
    }
}

impl From<ureq::Error> for IndexerError {
    fn from(err: ureq::Error) -> Self {
        IndexerError::Network(err.into())
    }
}

//! Error types for the breed ETL pipeline
//!
//! Each stage owns its own error. Only [`AttemptFailure`] is retried; every
//! other variant is terminal for the stage that raised it.

use std::time::Duration;
use thiserror::Error;

/// A single failed fetch attempt that is worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),
}

/// Terminal failure of the Fetcher.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Non-2xx response. Never retried.
    #[error("HTTP error {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Catalog fetch failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: AttemptFailure },

    /// Body was not a JSON array.
    #[error("Failed to decode catalog response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Why a raw record was left out of the normalized batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing id")]
    MissingId,

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("missing name")]
    MissingName,
}

/// Failure while writing to (or reading from) `dog_breeds`.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Schema setup failed: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("Upsert of breed {breed_id} failed: {source}")]
    Upsert {
        breed_id: i32,
        #[source]
        source: sqlx::Error,
    },

    #[error("Transaction failed: {0}")]
    Transaction(#[source] sqlx::Error),

    /// Read-only queries used by health checks
    #[error("Query failed: {0}")]
    Query(#[source] sqlx::Error),
}

/// Failure to append a `pipeline_logs` row.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to write run log: {0}")]
    Insert(#[source] sqlx::Error),
}

/// A run that ended with status FAILED.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Load failed: {0}")]
    Load(#[from] LoadError),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Extraction(_) => "extract",
            PipelineError::Load(_) => "load",
        }
    }
}

/// Invalid or missing configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Validation(String),
}

//! Breed catalog fetcher
//!
//! One GET against the catalog endpoint, retried on timeouts and connection
//! failures with exponential backoff. Any HTTP error status ends the fetch
//! immediately.

use crate::config::FetchConfig;
use crate::error::{AttemptFailure, ExtractionError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

/// One breed object exactly as returned by the API.
pub type RawRecord = serde_json::Value;

/// Something that can produce the raw breed catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawRecord>, ExtractionError>;
}

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait after the first failed attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait after failed attempt `attempt` (1-based): base, 2x base, 4x base...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_base())
    }
}

enum AttemptError {
    Retryable(AttemptFailure),
    Terminal(ExtractionError),
}

/// HTTP implementation of [`CatalogSource`]
pub struct BreedFetcher {
    client: Client,
    config: FetchConfig,
    policy: RetryPolicy,
}

impl BreedFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(ExtractionError::Client)?;
        let policy = RetryPolicy::from(&config);

        Ok(Self {
            client,
            config,
            policy,
        })
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn attempt(&self) -> Result<Vec<RawRecord>, AttemptError> {
        let mut request = self.client.get(&self.config.url);
        if let Some(ref key) = self.config.api_key {
            request = request.header(self.config.api_key_header.as_str(), key.as_str());
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Terminal(ExtractionError::Http {
                status: status.as_u16(),
                url: self.config.url.clone(),
            }));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice::<Vec<RawRecord>>(&body)
            .map_err(|e| AttemptError::Terminal(ExtractionError::Decode(e)))
    }

    fn classify(&self, err: reqwest::Error) -> AttemptError {
        if err.is_timeout() {
            AttemptError::Retryable(AttemptFailure::Timeout(self.config.timeout()))
        } else if err.is_connect() {
            AttemptError::Retryable(AttemptFailure::Connection(error_chain(&err)))
        } else {
            AttemptError::Terminal(ExtractionError::Request(err))
        }
    }
}

#[async_trait]
impl CatalogSource for BreedFetcher {
    async fn fetch(&self) -> Result<Vec<RawRecord>, ExtractionError> {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.attempt().await {
                Ok(records) => {
                    info!(attempt, max_attempts, records = records.len(), "Fetch attempt succeeded");
                    return Ok(records);
                },
                Err(AttemptError::Terminal(e)) => {
                    info!(attempt, max_attempts, outcome = "terminal", "Fetch attempt failed");
                    error!(attempt, url = %self.config.url, error = %e, "Breed catalog fetch failed");
                    return Err(e);
                },
                Err(AttemptError::Retryable(failure)) if attempt >= max_attempts => {
                    info!(attempt, max_attempts, error = %failure, "Fetch attempt failed");
                    error!(attempts = attempt, url = %self.config.url, error = %failure, "Max retries reached");
                    return Err(ExtractionError::RetriesExhausted {
                        attempts: attempt,
                        last: failure,
                    });
                },
                Err(AttemptError::Retryable(failure)) => {
                    let delay = self.policy.delay_after(attempt);
                    info!(
                        attempt,
                        max_attempts,
                        error = %failure,
                        retry_in_ms = delay.as_millis() as u64,
                        "Fetch attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                },
            }
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

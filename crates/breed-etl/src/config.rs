//! Configuration management
//!
//! Configuration is read once at startup and passed by value into the
//! fetcher and repository constructors.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

/// Breed catalog endpoint.
pub const DEFAULT_CATALOG_URL: &str = "https://api.thedogapi.com/v1/breeds";

/// Header carrying the API key.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Per-request timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Total attempts, including the first one.
pub const DEFAULT_FETCH_MAX_ATTEMPTS: u32 = 3;

/// Delay before the second attempt; doubles for every further attempt.
pub const DEFAULT_FETCH_BACKOFF_BASE_MILLIS: u64 = 1000;

/// Database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Reported to PostgreSQL as `application_name`.
pub const DEFAULT_APPLICATION_NAME: &str = "breed-etl";

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub database: DatabaseConfig,
}

/// Remote catalog settings
#[derive(Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub url: String,
    /// Unauthenticated requests are allowed, just rate limited harder.
    pub api_key: Option<String>,
    pub api_key_header: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_base_millis: u64,
    pub user_agent: String,
}

/// Database settings
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub connect_timeout_secs: u64,
    pub application_name: String,
}

// Secrets stay out of Debug output, and therefore out of the logs.
impl std::fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_header", &self.api_key_header)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base_millis", &self.backoff_base_millis)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("application_name", &self.application_name)
            .finish()
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_string(),
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_attempts: DEFAULT_FETCH_MAX_ATTEMPTS,
            backoff_base_millis: DEFAULT_FETCH_BACKOFF_BASE_MILLIS,
            user_agent: format!("breed-etl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    /// Catalog settings only; no database variables are required.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut fetch = FetchConfig::default();
        if let Some(url) = non_empty(lookup, "DOG_API_URL") {
            fetch.url = url;
        }
        fetch.api_key = non_empty(lookup, "DOG_API_KEY").or_else(|| non_empty(lookup, "x-api-key"));
        if let Some(secs) = parse_var(lookup, "FETCH_TIMEOUT_SECS")? {
            fetch.timeout_secs = secs;
        }
        if let Some(attempts) = parse_var(lookup, "FETCH_MAX_ATTEMPTS")? {
            fetch.max_attempts = attempts;
        }
        if let Some(millis) = parse_var(lookup, "FETCH_BACKOFF_BASE_MS")? {
            fetch.backoff_base_millis = millis;
        }
        fetch.validate()?;
        Ok(fetch)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation("Catalog URL cannot be empty".to_string()));
        }
        if self.api_key_header.trim().is_empty() {
            return Err(ConfigError::Validation("API key header cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation("Fetch timeout must be greater than 0".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "Fetch max attempts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = non_empty(lookup, "DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let mut database = DatabaseConfig::new(url);
        if let Some(secs) = parse_var(lookup, "DATABASE_CONNECT_TIMEOUT")? {
            database.connect_timeout_secs = secs;
        }
        database.validate()?;
        Ok(database)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Database connect timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Load `.env` (if present) and read the process environment.
    ///
    /// Recognised variables: `DATABASE_URL` (required), `DOG_API_KEY` (or the
    /// legacy `x-api-key`), `DOG_API_URL`, `FETCH_TIMEOUT_SECS`,
    /// `FETCH_MAX_ATTEMPTS`, `FETCH_BACKOFF_BASE_MS`, `DATABASE_CONNECT_TIMEOUT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            fetch: FetchConfig::from_lookup(&lookup)?,
            database: DatabaseConfig::from_lookup(&lookup)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fetch.validate()?;
        self.database.validate()
    }
}

/// Read `.env` into the process environment if the file exists.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        _ => Ok(None),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_catalog_contract() {
        let config =
            PipelineConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/dogs")]))
                .unwrap();

        assert_eq!(config.fetch.url, DEFAULT_CATALOG_URL);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(10));
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.backoff_base(), Duration::from_secs(1));
        assert!(config.fetch.api_key.is_none());
        assert_eq!(config.database.url, "postgres://localhost/dogs");
    }

    #[test]
    fn test_database_url_is_required() {
        let err = PipelineConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let err = PipelineConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_fetch_config_does_not_need_database() {
        let fetch = FetchConfig::from_lookup(&lookup(&[("DOG_API_URL", "http://localhost:9000/breeds")]))
            .unwrap();
        assert_eq!(fetch.url, "http://localhost:9000/breeds");
    }

    #[test]
    fn test_api_key_falls_back_to_legacy_variable() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/dogs"),
            ("DOG_API_KEY", ""),
            ("x-api-key", "legacy-key"),
        ]))
        .unwrap();
        assert_eq!(config.fetch.api_key.as_deref(), Some("legacy-key"));
    }

    #[test]
    fn test_invalid_numbers_are_reported() {
        let err = PipelineConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/dogs"),
            ("FETCH_MAX_ATTEMPTS", "three"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "FETCH_MAX_ATTEMPTS",
                value: "three".to_string()
            }
        );
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/dogs"),
            ("FETCH_MAX_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let mut config =
            PipelineConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://u:hunter2@db/dogs")]))
                .unwrap();
        config.fetch.api_key = Some("live_secret".to_string());

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("live_secret"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("DATABASE_URL", "postgres://env-host/dogs");
        std::env::set_var("FETCH_TIMEOUT_SECS", "4");

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.database.url, "postgres://env-host/dogs");
        assert_eq!(config.fetch.timeout_secs, 4);

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("FETCH_TIMEOUT_SECS");
    }
}

//! Breed ETL
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Fetches the public dog breed catalog, normalizes it and upserts it into
//! PostgreSQL, recording every run in an audit table.
//!
//! # Overview
//!
//! - **Fetcher** ([`fetcher`]): HTTP GET with timeout, retry and backoff
//! - **Normalizer** ([`normalizer`]): raw JSON to [`NormalizedRecord`]
//! - **Repository** ([`repository`]): `dog_breeds` and `pipeline_logs`
//! - **Orchestrator** ([`orchestrator`]): runs the stages, writes the audit row
//!
//! # Example
//!
//! ```no_run
//! use breed_etl::{BreedFetcher, BreedNormalizer, PgBreedRepository, Pipeline, PipelineConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PipelineConfig::from_env()?;
//! let pipeline = Pipeline::new(
//!     BreedFetcher::new(config.fetch)?,
//!     PgBreedRepository::new(config.database),
//!     BreedNormalizer::new()?,
//! );
//! let report = pipeline.run().await?;
//! println!("loaded {} breeds", report.loaded);
//! # Ok(())
//! # }
//! ```
//!
//! [`NormalizedRecord`]: breed_common::NormalizedRecord

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod normalizer;
pub mod orchestrator;
pub mod repository;

// Re-export commonly used types
pub use cli::{Cli, Commands};
pub use config::{DatabaseConfig, FetchConfig, PipelineConfig};
pub use error::{ConfigError, ExtractionError, LoadError, LogError, PipelineError};
pub use fetcher::{BreedFetcher, CatalogSource, RawRecord, RetryPolicy};
pub use normalizer::{BreedNormalizer, NormalizeOutcome, SkippedRecord};
pub use orchestrator::{Pipeline, RunReport};
pub use repository::{BreedRepository, PgBreedRepository, StatusCount};

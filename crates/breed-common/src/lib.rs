//! Breed ETL Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types and logging setup for the breed ETL workspace.
//!
//! - **Types**: the canonical breed row and the run-log audit entry
//! - **Logging**: `tracing` subscriber configuration (console, file, JSON)
//!
//! # Example
//!
//! ```no_run
//! use breed_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod types;

pub use types::{BreedRow, NormalizedRecord, RunLogEntry, RunStatus, UNKNOWN};

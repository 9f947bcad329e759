//! `breed-etl init-schema` command implementation

use crate::config::DatabaseConfig;
use crate::repository::{BreedRepository, PgBreedRepository};
use anyhow::Result;
use colored::Colorize;

pub async fn run(config: DatabaseConfig) -> Result<()> {
    PgBreedRepository::new(config).ensure_schema().await?;
    println!("{} Tables dog_breeds and pipeline_logs are ready", "✓".green());
    Ok(())
}

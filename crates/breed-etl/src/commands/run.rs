//! `breed-etl run` command implementation

use crate::config::PipelineConfig;
use crate::fetcher::BreedFetcher;
use crate::normalizer::BreedNormalizer;
use crate::orchestrator::Pipeline;
use crate::repository::PgBreedRepository;
use anyhow::Result;
use colored::Colorize;

/// Run the full pipeline once.
pub async fn run(config: PipelineConfig) -> Result<()> {
    let pipeline = Pipeline::new(
        BreedFetcher::new(config.fetch)?,
        PgBreedRepository::new(config.database),
        BreedNormalizer::new()?,
    );

    let report = pipeline.run().await?;

    println!("{} Pipeline run {}", "✓".green(), report.run_id);
    println!("  Fetched: {}", report.fetched);
    println!("  Loaded:  {}", report.loaded);
    if !report.skipped.is_empty() {
        println!("  Skipped: {}", report.skipped.len().to_string().yellow());
    }
    if let Some(ref log_error) = report.log_error {
        println!("  {} run log not written: {}", "warning:".yellow().bold(), log_error);
    }

    Ok(())
}

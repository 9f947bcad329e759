//! `breed-etl preview` command implementation
//!
//! Prints normalized records as JSON on stdout; the database is never opened.

use crate::config::FetchConfig;
use crate::fetcher::{BreedFetcher, CatalogSource};
use crate::normalizer::BreedNormalizer;
use anyhow::Result;

pub async fn run(config: FetchConfig, limit: Option<usize>) -> Result<()> {
    let raw = BreedFetcher::new(config)?.fetch().await?;
    let outcome = BreedNormalizer::new()?.normalize(&raw);

    let shown = limit.unwrap_or(outcome.accepted.len());
    let records = &outcome.accepted[..shown.min(outcome.accepted.len())];

    println!("{}", serde_json::to_string_pretty(records)?);
    eprintln!(
        "{} of {} normalized records shown, {} skipped",
        records.len(),
        outcome.accepted.len(),
        outcome.skipped.len()
    );
    Ok(())
}

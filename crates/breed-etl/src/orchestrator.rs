//! Pipeline orchestration
//!
//! Runs `ensure_schema -> fetch -> normalize -> upsert_batch` and always
//! finishes with exactly one `pipeline_logs` entry. The orchestrator is the
//! only place that decides whether a run succeeded.

use crate::error::PipelineError;
use crate::fetcher::CatalogSource;
use crate::normalizer::{BreedNormalizer, SkippedRecord};
use crate::repository::BreedRepository;
use breed_common::RunStatus;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Correlates the log lines of one run
    pub run_id: Uuid,
    pub fetched: usize,
    pub loaded: usize,
    pub skipped: Vec<SkippedRecord>,
    /// Set when the SUCCESS audit row could not be written
    pub log_error: Option<String>,
}

struct StageCounts {
    fetched: usize,
    loaded: usize,
    skipped: Vec<SkippedRecord>,
}

pub struct Pipeline<S, R> {
    source: S,
    repository: R,
    normalizer: BreedNormalizer,
}

impl<S, R> Pipeline<S, R>
where
    S: CatalogSource,
    R: BreedRepository,
{
    pub fn new(source: S, repository: R, normalizer: BreedNormalizer) -> Self {
        Self {
            source,
            repository,
            normalizer,
        }
    }

    /// Execute one run. A failure is logged to `pipeline_logs` and returned.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let run_id = Uuid::new_v4();
        self.run_logged(run_id)
            .instrument(info_span!("pipeline_run", %run_id))
            .await
    }

    async fn run_logged(&self, run_id: Uuid) -> Result<RunReport, PipelineError> {
        info!("Starting breed ETL run");

        match self.execute().await {
            Ok(counts) => {
                let processed = i32::try_from(counts.loaded).unwrap_or(i32::MAX);
                let log_error = self.record(RunStatus::Success, Some(processed), None).await;

                info!(
                    fetched = counts.fetched,
                    loaded = counts.loaded,
                    skipped = counts.skipped.len(),
                    "Breed ETL run completed"
                );

                Ok(RunReport {
                    run_id,
                    fetched: counts.fetched,
                    loaded: counts.loaded,
                    skipped: counts.skipped,
                    log_error,
                })
            },
            Err(err) => {
                let message = err.to_string();
                error!(stage = err.stage(), error = %message, "Breed ETL run failed");
                // The pipeline error wins over any failure to record it.
                self.record(RunStatus::Failed, None, Some(&message)).await;
                Err(err)
            },
        }
    }

    async fn execute(&self) -> Result<StageCounts, PipelineError> {
        self.repository.ensure_schema().await?;

        let raw = self.source.fetch().await?;
        let outcome = self.normalizer.normalize(&raw);
        let loaded = self.repository.upsert_batch(&outcome.accepted).await?;

        Ok(StageCounts {
            fetched: raw.len(),
            loaded,
            skipped: outcome.skipped,
        })
    }

    /// Write the audit row; returns the failure text instead of raising it.
    async fn record(
        &self,
        status: RunStatus,
        records_processed: Option<i32>,
        error_message: Option<&str>,
    ) -> Option<String> {
        match self
            .repository
            .log_run(status, records_processed, error_message)
            .await
        {
            Ok(_) => None,
            Err(e) => {
                error!(status = %status, error = %e, "Failed to write pipeline_logs entry");
                Some(e.to_string())
            },
        }
    }
}

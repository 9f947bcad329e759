//! Common types used across the breed ETL workspace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder stored for any optional text field that is null, blank or absent.
pub const UNKNOWN: &str = "Unknown";

/// Canonical shape of one breed, ready to be loaded into `dog_breeds`.
///
/// `created_at` is intentionally absent: the load timestamp is assigned by the
/// database when the row is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub breed_id: i32,
    pub breed_name: String,
    pub breed_group: String,
    pub bred_for: String,
    pub life_span: String,
    pub temperament: String,
    pub origin: String,
    pub weight_kg: String,
    pub height_cm: String,
    pub temperament_count: Option<i32>,
    pub avg_lifespan_years: Option<f64>,
}

/// A `dog_breeds` row as persisted, including the last-loaded timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedRow {
    #[serde(flatten)]
    pub record: NormalizedRecord,
    pub created_at: DateTime<Utc>,
}

/// Outcome of one pipeline invocation as written to `pipeline_logs.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    /// Database representation
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(RunStatus::Success),
            "FAILED" => Ok(RunStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid run status: {}", s)),
        }
    }
}

/// One row of the append-only `pipeline_logs` audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub id: i64,
    pub run_time: DateTime<Utc>,
    pub status: RunStatus,
    pub records_processed: Option<i32>,
    pub error_message: Option<String>,
}

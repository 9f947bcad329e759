//! PostgreSQL storage for breeds and the run audit log
//!
//! Owns the `dog_breeds` and `pipeline_logs` tables. Every operation opens its
//! own connection and closes it before returning; nothing is pooled between
//! calls, which keeps infrequent batch runs friendly to connection-limited
//! hosted databases.

use crate::config::DatabaseConfig;
use crate::error::{LoadError, LogError};
use async_trait::async_trait;
use breed_common::{BreedRow, NormalizedRecord, RunLogEntry, RunStatus};
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Connection, Row};
use tracing::{debug, info, warn};

const CREATE_BREEDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS dog_breeds (
    breed_id INTEGER PRIMARY KEY CHECK (breed_id > 0),
    breed_name TEXT NOT NULL,
    breed_group TEXT,
    bred_for TEXT,
    life_span TEXT,
    temperament TEXT,
    origin TEXT,
    weight_kg TEXT,
    height_cm TEXT,
    temperament_count INTEGER,
    avg_lifespan_years DOUBLE PRECISION,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_LOGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS pipeline_logs (
    id BIGSERIAL PRIMARY KEY,
    run_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    status TEXT NOT NULL CHECK (status IN ('SUCCESS', 'FAILED')),
    records_processed INTEGER,
    error_message TEXT
)
"#;

const CREATE_LOGS_RUN_TIME_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS pipeline_logs_run_time_idx ON pipeline_logs (run_time)";

// created_at tracks the last load, so it is refreshed on conflict too.
const UPSERT_BREED: &str = r#"
INSERT INTO dog_breeds
    (breed_id, breed_name, breed_group, bred_for, life_span,
     temperament, origin, weight_kg, height_cm,
     temperament_count, avg_lifespan_years, created_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
ON CONFLICT (breed_id) DO UPDATE SET
    breed_name = EXCLUDED.breed_name,
    breed_group = EXCLUDED.breed_group,
    bred_for = EXCLUDED.bred_for,
    life_span = EXCLUDED.life_span,
    temperament = EXCLUDED.temperament,
    origin = EXCLUDED.origin,
    weight_kg = EXCLUDED.weight_kg,
    height_cm = EXCLUDED.height_cm,
    temperament_count = EXCLUDED.temperament_count,
    avg_lifespan_years = EXCLUDED.avg_lifespan_years,
    created_at = NOW()
"#;

const INSERT_RUN_LOG: &str = r#"
INSERT INTO pipeline_logs (status, records_processed, error_message)
VALUES ($1, $2, $3)
RETURNING id
"#;

/// Persistence operations used by the pipeline.
#[async_trait]
pub trait BreedRepository: Send + Sync {
    /// Create both tables if absent. Never drops or alters existing data.
    async fn ensure_schema(&self) -> Result<(), LoadError>;

    /// Upsert the whole batch in one transaction; returns `records.len()`.
    async fn upsert_batch(&self, records: &[NormalizedRecord]) -> Result<usize, LoadError>;

    /// Append one audit row in its own transaction; returns its id.
    async fn log_run(
        &self,
        status: RunStatus,
        records_processed: Option<i32>,
        error_message: Option<&str>,
    ) -> Result<i64, LogError>;
}

/// Run count for one status inside a reporting window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: RunStatus,
    pub runs: i64,
}

pub struct PgBreedRepository {
    config: DatabaseConfig,
}

impl PgBreedRepository {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<PgConnection, sqlx::Error> {
        let options: PgConnectOptions = self.config.url.parse()?;
        let options = options.application_name(&self.config.application_name);
        let timeout = self.config.connect_timeout();

        match tokio::time::timeout(timeout, PgConnection::connect_with(&options)).await {
            Ok(conn) => conn,
            Err(_) => Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("connection not established within {:?}", timeout),
            ))),
        }
    }

    /// All persisted breeds ordered by id
    pub async fn fetch_breeds(&self) -> Result<Vec<BreedRow>, LoadError> {
        let mut conn = self.connect().await.map_err(LoadError::Connect)?;
        let result = sqlx::query(
            r#"
            SELECT breed_id, breed_name, breed_group, bred_for, life_span,
                   temperament, origin, weight_kg, height_cm,
                   temperament_count, avg_lifespan_years, created_at
            FROM dog_breeds
            ORDER BY breed_id
            "#,
        )
        .try_map(|row: PgRow| breed_row(&row))
        .fetch_all(&mut conn)
        .await
        .map_err(LoadError::Query);
        close(conn).await;
        result
    }

    /// Most recent audit rows, newest first
    pub async fn recent_runs(&self, limit: i64) -> Result<Vec<RunLogEntry>, LoadError> {
        let mut conn = self.connect().await.map_err(LoadError::Connect)?;
        let result = sqlx::query(
            r#"
            SELECT id, run_time, status, records_processed, error_message
            FROM pipeline_logs
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .try_map(|row: PgRow| run_log_entry(&row))
        .fetch_all(&mut conn)
        .await
        .map_err(LoadError::Query);
        close(conn).await;
        result
    }

    /// Runs per status over the last `days` days
    pub async fn run_summary(&self, days: i32) -> Result<Vec<StatusCount>, LoadError> {
        let mut conn = self.connect().await.map_err(LoadError::Connect)?;
        let result = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS runs
            FROM pipeline_logs
            WHERE run_time >= NOW() - make_interval(days => $1)
            GROUP BY status
            ORDER BY status DESC
            "#,
        )
        .bind(days)
        .try_map(|row: PgRow| {
            Ok(StatusCount {
                status: parse_status(row.try_get("status")?)?,
                runs: row.try_get("runs")?,
            })
        })
        .fetch_all(&mut conn)
        .await
        .map_err(LoadError::Query);
        close(conn).await;
        result
    }
}

#[async_trait]
impl BreedRepository for PgBreedRepository {
    async fn ensure_schema(&self) -> Result<(), LoadError> {
        let mut conn = self.connect().await.map_err(LoadError::Connect)?;
        let result = create_schema(&mut conn).await;
        close(conn).await;

        if result.is_ok() {
            debug!("Tables dog_breeds and pipeline_logs verified");
        }
        result
    }

    async fn upsert_batch(&self, records: &[NormalizedRecord]) -> Result<usize, LoadError> {
        if records.is_empty() {
            info!("Nothing to load");
            return Ok(0);
        }

        let mut conn = self.connect().await.map_err(LoadError::Connect)?;
        let result = upsert_in_transaction(&mut conn, records).await;
        close(conn).await;

        if let Ok(count) = result {
            info!(records = count, "Upserted breeds into dog_breeds");
        }
        result
    }

    async fn log_run(
        &self,
        status: RunStatus,
        records_processed: Option<i32>,
        error_message: Option<&str>,
    ) -> Result<i64, LogError> {
        let mut conn = self.connect().await.map_err(LogError::Connect)?;
        let result = sqlx::query_scalar::<_, i64>(INSERT_RUN_LOG)
            .bind(status.as_str())
            .bind(records_processed)
            .bind(error_message)
            .fetch_one(&mut conn)
            .await
            .map_err(LogError::Insert);
        close(conn).await;

        if let Ok(id) = result {
            debug!(log_id = id, status = %status, "Wrote run log entry");
        }
        result
    }
}

async fn create_schema(conn: &mut PgConnection) -> Result<(), LoadError> {
    let mut tx = conn.begin().await.map_err(LoadError::Schema)?;
    for statement in [CREATE_BREEDS_TABLE, CREATE_LOGS_TABLE, CREATE_LOGS_RUN_TIME_INDEX] {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(LoadError::Schema)?;
    }
    tx.commit().await.map_err(LoadError::Schema)
}

async fn upsert_in_transaction(
    conn: &mut PgConnection,
    records: &[NormalizedRecord],
) -> Result<usize, LoadError> {
    let mut tx = conn.begin().await.map_err(LoadError::Transaction)?;

    for record in records {
        let outcome = sqlx::query(UPSERT_BREED)
            .bind(record.breed_id)
            .bind(&record.breed_name)
            .bind(&record.breed_group)
            .bind(&record.bred_for)
            .bind(&record.life_span)
            .bind(&record.temperament)
            .bind(&record.origin)
            .bind(&record.weight_kg)
            .bind(&record.height_cm)
            .bind(record.temperament_count)
            .bind(record.avg_lifespan_years)
            .execute(&mut *tx)
            .await;

        if let Err(source) = outcome {
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "Rollback failed; the transaction is discarded with the connection");
            }
            return Err(LoadError::Upsert {
                breed_id: record.breed_id,
                source,
            });
        }
    }

    tx.commit().await.map_err(LoadError::Transaction)?;
    Ok(records.len())
}

async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        warn!(error = %e, "Failed to close database connection cleanly");
    }
}

fn parse_status(raw: String) -> Result<RunStatus, sqlx::Error> {
    raw.parse::<RunStatus>()
        .map_err(|e| sqlx::Error::Decode(e.into()))
}

fn breed_row(row: &PgRow) -> Result<BreedRow, sqlx::Error> {
    Ok(BreedRow {
        record: NormalizedRecord {
            breed_id: row.try_get("breed_id")?,
            breed_name: row.try_get("breed_name")?,
            breed_group: row.try_get("breed_group")?,
            bred_for: row.try_get("bred_for")?,
            life_span: row.try_get("life_span")?,
            temperament: row.try_get("temperament")?,
            origin: row.try_get("origin")?,
            weight_kg: row.try_get("weight_kg")?,
            height_cm: row.try_get("height_cm")?,
            temperament_count: row.try_get("temperament_count")?,
            avg_lifespan_years: row.try_get("avg_lifespan_years")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn run_log_entry(row: &PgRow) -> Result<RunLogEntry, sqlx::Error> {
    Ok(RunLogEntry {
        id: row.try_get("id")?,
        run_time: row.try_get("run_time")?,
        status: parse_status(row.try_get("status")?)?,
        records_processed: row.try_get("records_processed")?,
        error_message: row.try_get("error_message")?,
    })
}

//! Common test utilities for breed ETL integration tests using testcontainers
//!
//! Each test gets its own PostgreSQL container. No schema is applied up
//! front; tests call `ensure_schema` themselves so that it is exercised too.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestPostgres;
//!
//! #[tokio::test]
//! async fn test_with_postgres() {
//!     let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
//!     let repository = pg.repository();
//!     // Your test code here
//! }
//! ```

#![allow(dead_code)]

use anyhow::{Context, Result};
use breed_etl::{DatabaseConfig, PgBreedRepository};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::{debug, info};

/// PostgreSQL image tag used by the tests
pub const POSTGRES_TAG: &str = "16-alpine";

/// PostgreSQL test container wrapper
pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection_string: String,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag(POSTGRES_TAG)
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);
        debug!("PostgreSQL connection: {}", connection_string);

        // Only used for assertions; the repository opens its own connections.
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self {
            _container: container,
            pool,
            connection_string,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.connection_string.clone())
    }

    pub fn repository(&self) -> PgBreedRepository {
        PgBreedRepository::new(self.database_config())
    }

    pub async fn count(&self, table: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count rows in {}", table))?;
        Ok(count)
    }
}

/// Initialize test tracing
///
/// Call at the start of a test to see log output.
pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,breed_etl=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}

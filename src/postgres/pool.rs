//! PostgreSQL connection pool with circuit breaker integration.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

use super::circuit_breaker::CircuitBreaker;

/// Idempotent DDL for the queue and token tables.
const SCHEMA: &str = include_str!("schema.sql");

/// Errors that can occur with the PostgreSQL pool.
#[derive(Debug, Error)]
pub enum PostgresPoolError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Circuit breaker is open")]
    CircuitOpen,
}

/// PostgreSQL connection pool with circuit breaker integration.
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
    circuit_breaker: Arc<CircuitBreaker>,
    database_url: String,
}

impl PostgresPool {
    /// Connect using the database configuration.
    pub async fn connect(
        config: &DatabaseConfig,
        url: &str,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, PostgresPoolError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(url)
            .await?;

        let pool = Self::from_pool(pool, url, circuit_breaker);

        tracing::info!(
            pool_size = config.pool_size,
            url = %pool.database_url_masked(),
            "PostgreSQL connection pool created"
        );

        Ok(pool)
    }

    /// Wrap an existing pool (used by tests and lazy connections).
    pub fn from_pool(pool: PgPool, url: &str, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            pool,
            circuit_breaker,
            database_url: url.to_string(),
        }
    }

    /// Create the queue and token tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), PostgresPoolError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("PostgreSQL schema ensured");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    /// Check if the circuit breaker allows operations.
    pub fn is_available(&self) -> bool {
        self.circuit_breaker.allow_request()
    }

    /// Execute an operation with circuit breaker protection.
    pub async fn execute_with_circuit_breaker<T, F, Fut>(
        &self,
        operation: F,
    ) -> Result<T, PostgresPoolError>
    where
        F: FnOnce(PgPool) -> Fut,
        Fut: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        if !self.circuit_breaker.allow_request() {
            return Err(PostgresPoolError::CircuitOpen);
        }

        match operation(self.pool.clone()).await {
            Ok(result) => {
                self.circuit_breaker.record_success();
                Ok(result)
            }
            Err(e) => {
                // Row-level errors say nothing about database health
                if !matches!(
                    e,
                    sqlx::Error::RowNotFound
                        | sqlx::Error::ColumnDecode { .. }
                        | sqlx::Error::ColumnNotFound(_)
                        | sqlx::Error::Decode(_)
                ) {
                    self.circuit_breaker.record_failure();
                }
                Err(PostgresPoolError::Sqlx(e))
            }
        }
    }

    /// Get the database URL with the password masked for logging.
    pub fn database_url_masked(&self) -> String {
        mask_url(&self.database_url)
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}

fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // "postgres://" has a colon too; only mask user:password pairs
            if !url[colon_pos..].starts_with("://") {
                return format!("{}***{}", &url[..colon_pos + 1], &url[at_pos..]);
            }
        }
    }
    url.to_string()
}

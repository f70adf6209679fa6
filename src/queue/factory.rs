//! Queue store factory

use std::sync::Arc;

use crate::config::{DatabaseConfig, QueueBackendKind, QueueConfig};
use crate::postgres::PostgresPool;

use super::backend::QueueStore;
use super::memory_backend::MemoryQueueStore;
use super::postgres_backend::PostgresQueueStore;

/// Create the queue store selected by configuration.
///
/// The choice is made once at startup:
/// - `postgres` (or `auto` with `database.url` set): `PostgresQueueStore`
/// - `memory` (or `auto` without a database): `MemoryQueueStore`
///
/// A postgres selection without a pool falls back to memory with a warning.
pub fn create_queue_store(
    settings: &QueueConfig,
    database: &DatabaseConfig,
    postgres_pool: Option<PostgresPool>,
) -> Arc<dyn QueueStore> {
    match (settings.resolved_backend(database), postgres_pool) {
        (QueueBackendKind::Postgres, Some(pool)) => {
            tracing::info!(backend = "postgres", "Creating PostgreSQL queue store");
            Arc::new(PostgresQueueStore::new(pool))
        }
        (QueueBackendKind::Postgres, None) => {
            tracing::warn!("PostgreSQL queue store requested but no pool provided, falling back to memory");
            Arc::new(MemoryQueueStore::new())
        }
        _ => {
            tracing::info!(backend = "memory", "Creating in-memory queue store");
            Arc::new(MemoryQueueStore::new())
        }
    }
}

//! Storage for the Slack bot token obtained through OAuth.
//!
//! The token store is selected together with the queue store: PostgreSQL when
//! a database is configured, memory otherwise.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::postgres::{PostgresPool, PostgresPoolError};

pub use memory::MemoryTokenStore;
pub use postgres::PostgresTokenStore;

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl From<PostgresPoolError> for TokenStoreError {
    fn from(err: PostgresPoolError) -> Self {
        match err {
            PostgresPoolError::Sqlx(e) => Self::Postgres(e),
            PostgresPoolError::CircuitOpen => Self::Unavailable("Circuit breaker is open".to_string()),
        }
    }
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The stored token, `None` before the app has been installed.
    async fn get_token(&self) -> Result<Option<String>, TokenStoreError>;

    async fn set_token(&self, token: &str) -> Result<(), TokenStoreError>;
}

/// Create a token store matching the queue store selection.
pub fn create_token_store(
    postgres_pool: Option<PostgresPool>,
    initial_token: Option<String>,
) -> Arc<dyn TokenStore> {
    match postgres_pool {
        Some(pool) => Arc::new(PostgresTokenStore::new(pool)),
        None => Arc::new(MemoryTokenStore::new(initial_token)),
    }
}

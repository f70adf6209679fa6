//! Store contract for channel queues.
//!
//! Every storage implementation (memory, PostgreSQL) exposes the same
//! `QueueStore` trait so the bot can be wired to either one at startup
//! without knowing which is in use.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during queue store operations.
#[derive(Debug, Error)]
pub enum QueueStoreError {
    /// The participant is not waiting in the queue
    #[error("user ({user_id}) not found in queue with id: {queue_id}")]
    NotFound { queue_id: String, user_id: String },

    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Stored data could not be read back
    #[error("Storage error: {0}")]
    Storage(String),

    /// Backend is temporarily unavailable (e.g., circuit breaker open)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The operation did not complete before its deadline
    #[error("Queue operation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl QueueStoreError {
    pub fn not_found(queue_id: &str, user_id: &str) -> Self {
        Self::NotFound {
            queue_id: queue_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// Whether this error came from the storage medium rather than the
    /// queue contents. Storage errors are transient from the caller's view.
    pub fn is_storage(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Timeout(_) => "timeout",
            Self::Unavailable(_) => "unavailable",
            Self::Postgres(_) | Self::Storage(_) => "storage",
        }
    }
}

/// One participant waiting in a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable platform user identifier
    pub user_id: String,

    /// Display name, not used as identity
    pub user_name: String,

    /// Assigned by the durable backend on insert; never supplied by callers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            created_at: None,
        }
    }
}

/// Storage abstraction for per-channel queues.
///
/// # Ordering
///
/// A queue is an ordered sequence in arrival order. New entries always go at
/// the tail and removals never reorder the remaining entries.
///
/// # Thread Safety
///
/// Implementations are `Send + Sync` so they can be shared behind an `Arc`,
/// but a read-modify-read sequence against one queue is only race free when
/// the caller serializes calls per queue (see `QueueService`).
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Backend identifier (`"memory"`, `"postgres"`).
    fn backend_name(&self) -> &'static str;

    /// Append `item` to the queue, creating the queue if it has never been seen.
    ///
    /// Duplicate user ids are not rejected here. Returns the full ordered
    /// queue after the insert.
    async fn enqueue(&self, queue_id: &str, item: Item) -> Result<Vec<Item>, QueueStoreError>;

    /// Remove the entry matching `item.user_id`.
    ///
    /// # Errors
    ///
    /// Returns `QueueStoreError::NotFound` when no entry with that user id is
    /// waiting, including when the queue has never been used.
    async fn dequeue(&self, queue_id: &str, item: &Item) -> Result<Vec<Item>, QueueStoreError>;

    /// Read the full ordered queue. An unknown queue is empty.
    async fn snapshot(&self, queue_id: &str) -> Result<Vec<Item>, QueueStoreError>;
}

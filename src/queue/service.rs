//! Serialized access to the queue store.
//!
//! `QueueService` is the only path through which the bot touches a queue. It
//! holds the queue lock for the whole read-modify-read sequence and bounds
//! each sequence with a deadline, so a stuck database call cannot keep a
//! queue locked forever.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::{LockScope, QueueConfig};
use crate::metrics::QueueMetrics;

use super::backend::{Item, QueueStore, QueueStoreError};
use super::lock::QueueLocks;

#[derive(Debug, Error)]
pub enum QueueServiceError {
    /// The participant already holds a position in this queue
    #[error("user ({user_id}) is already in queue with id: {queue_id}")]
    AlreadyQueued { queue_id: String, user_id: String },

    #[error(transparent)]
    Store(#[from] QueueStoreError),
}

impl QueueServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyQueued { .. } => "already_queued",
            Self::Store(e) => e.kind(),
        }
    }
}

pub struct QueueService {
    store: Arc<dyn QueueStore>,
    locks: QueueLocks,
    operation_timeout: Duration,
}

impl QueueService {
    pub fn new(store: Arc<dyn QueueStore>, config: &QueueConfig) -> Self {
        Self::with_options(
            store,
            config.lock_scope,
            Duration::from_millis(config.operation_timeout_ms),
        )
    }

    pub fn with_options(
        store: Arc<dyn QueueStore>,
        lock_scope: LockScope,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            store,
            locks: QueueLocks::new(lock_scope),
            operation_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }

    pub fn lock_scope(&self) -> LockScope {
        self.locks.scope()
    }

    /// Add a participant at the tail of the queue.
    ///
    /// Rejects a participant who is already waiting, which keeps user ids
    /// unique within a queue.
    #[tracing::instrument(
        name = "queue.join",
        skip(self, item),
        fields(queue_id = %queue_id, user_id = %item.user_id)
    )]
    pub async fn join(&self, queue_id: &str, item: Item) -> Result<Vec<Item>, QueueServiceError> {
        let store = self.store.clone();
        self.run("join", queue_id, async move {
            let current = store.snapshot(queue_id).await?;
            if current.iter().any(|queued| queued.user_id == item.user_id) {
                return Err(QueueServiceError::AlreadyQueued {
                    queue_id: queue_id.to_string(),
                    user_id: item.user_id,
                });
            }
            Ok(store.enqueue(queue_id, item).await?)
        })
        .await
    }

    /// Remove a participant from the queue.
    #[tracing::instrument(
        name = "queue.leave",
        skip(self, item),
        fields(queue_id = %queue_id, user_id = %item.user_id)
    )]
    pub async fn leave(&self, queue_id: &str, item: Item) -> Result<Vec<Item>, QueueServiceError> {
        let store = self.store.clone();
        self.run("leave", queue_id, async move {
            Ok(store.dequeue(queue_id, &item).await?)
        })
        .await
    }

    /// Read the current queue.
    pub async fn peek(&self, queue_id: &str) -> Result<Vec<Item>, QueueServiceError> {
        let store = self.store.clone();
        self.run("peek", queue_id, async move { Ok(store.snapshot(queue_id).await?) })
            .await
    }

    /// Run `operation` while holding the queue lock, bounded by the deadline.
    ///
    /// The guard is dropped when this function returns, whichever way it
    /// returns.
    async fn run<F>(
        &self,
        operation: &'static str,
        queue_id: &str,
        fut: F,
    ) -> Result<Vec<Item>, QueueServiceError>
    where
        F: Future<Output = Result<Vec<Item>, QueueServiceError>>,
    {
        let wait_start = Instant::now();
        let _guard = self.locks.acquire(queue_id).await;
        QueueMetrics::record_lock_wait(wait_start.elapsed());

        let start = Instant::now();
        let result = match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    queue_id = %queue_id,
                    operation = operation,
                    backend = self.store.backend_name(),
                    timeout_ms = self.operation_timeout.as_millis() as u64,
                    "Queue operation timed out"
                );
                Err(QueueStoreError::Timeout(self.operation_timeout).into())
            }
        };

        let outcome = match &result {
            Ok(queue) => {
                tracing::debug!(
                    queue_id = %queue_id,
                    operation = operation,
                    queue_size = queue.len(),
                    "Queue operation completed"
                );
                "ok"
            }
            Err(e) => e.kind(),
        };
        QueueMetrics::record_operation(operation, outcome, start.elapsed());

        result
    }
}

//! In-memory queue store using DashMap.
//!
//! Queues live in process memory and are lost on service restart.

use async_trait::async_trait;
use dashmap::DashMap;

use super::backend::{Item, QueueStore, QueueStoreError};

/// In-memory queue store.
///
/// Each queue id maps to a `Vec<Item>` kept in append order.
/// Queues are never removed, so an emptied queue stays addressable.
#[derive(Default)]
pub struct MemoryQueueStore {
    queues: DashMap<String, Vec<Item>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queue ids that have been seen.
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn enqueue(&self, queue_id: &str, item: Item) -> Result<Vec<Item>, QueueStoreError> {
        let mut queue = self.queues.entry(queue_id.to_string()).or_default();
        queue.push(item);

        tracing::debug!(
            queue_id = %queue_id,
            queue_size = queue.len(),
            "Item appended to in-memory queue"
        );

        Ok(queue.value().clone())
    }

    async fn dequeue(&self, queue_id: &str, item: &Item) -> Result<Vec<Item>, QueueStoreError> {
        let Some(mut queue) = self.queues.get_mut(queue_id) else {
            return Err(QueueStoreError::not_found(queue_id, &item.user_id));
        };

        let position = queue
            .iter()
            .position(|queued| queued.user_id == item.user_id)
            .ok_or_else(|| QueueStoreError::not_found(queue_id, &item.user_id))?;

        // Vec::remove shifts the tail left, keeping relative order
        queue.remove(position);

        tracing::debug!(
            queue_id = %queue_id,
            position = position,
            queue_size = queue.len(),
            "Item removed from in-memory queue"
        );

        Ok(queue.value().clone())
    }

    async fn snapshot(&self, queue_id: &str) -> Result<Vec<Item>, QueueStoreError> {
        Ok(self
            .queues
            .get(queue_id)
            .map(|q| q.value().clone())
            .unwrap_or_default())
    }
}

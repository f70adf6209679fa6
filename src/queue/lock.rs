//! Scoped mutual exclusion for queue mutations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::LockScope;

/// Key used for every queue when a single global lock is configured.
const GLOBAL_KEY: &str = "*";

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Hands out one async mutex per queue id (or a single shared one).
///
/// Entries live only while some task holds or waits for them, so the map
/// stays as small as the number of queues currently in use.
pub struct QueueLocks {
    scope: LockScope,
    locks: LockMap,
}

/// Exclusive access to one queue. Unlocks on drop, on every exit path of the
/// holder (success, error, timeout, panic).
pub struct QueueGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: &'a LockMap,
}

impl Drop for QueueGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map's own reference left: nobody holds or waits for it
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl QueueLocks {
    pub fn new(scope: LockScope) -> Self {
        Self {
            scope,
            locks: DashMap::new(),
        }
    }

    pub fn scope(&self) -> LockScope {
        self.scope
    }

    /// Wait for exclusive access to `queue_id`.
    pub async fn acquire(&self, queue_id: &str) -> QueueGuard<'_> {
        let key = match self.scope {
            LockScope::PerQueue => queue_id,
            LockScope::Global => GLOBAL_KEY,
        };

        // Clone the Arc out so the map shard is not held while waiting
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        QueueGuard {
            guard: Some(mutex.lock_owned().await),
            key: key.to_string(),
            locks: &self.locks,
        }
    }

    /// Number of locks currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

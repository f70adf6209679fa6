//! Per-channel waiting queues.
//!
//! # Architecture
//!
//! Storage sits behind the `QueueStore` trait:
//!
//! - `MemoryQueueStore`: process-local storage using DashMap (default)
//! - `PostgresQueueStore`: one row per entry in PostgreSQL, shared across instances
//!
//! `QueueService` wraps the selected store with a per-queue lock and an
//! operation deadline. Use `create_queue_store()` to build the store from
//! configuration.

pub mod backend;
mod factory;
mod lock;
pub mod memory_backend;
pub mod postgres_backend;
mod service;

pub use backend::{Item, QueueStore, QueueStoreError};
pub use factory::create_queue_store;
pub use lock::{QueueGuard, QueueLocks};
pub use memory_backend::MemoryQueueStore;
pub use postgres_backend::PostgresQueueStore;
pub use service::{QueueService, QueueServiceError};

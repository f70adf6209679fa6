//! PostgreSQL persistence module.
//!
//! Provides connection pooling, schema bootstrap and a circuit breaker for
//! the durable queue and token stores.

mod circuit_breaker;
pub mod pool;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use pool::{PostgresPool, PostgresPoolError};

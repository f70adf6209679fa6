//! Circuit breaker guarding the durable store.
//!
//! While open, queue and token operations fail fast instead of waiting on a
//! database that is known to be down. The queue lock is held across store
//! calls, so failing fast keeps other channels moving.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow through normally
    Closed,
    /// Requests are rejected until the reset timeout elapses
    Open,
    /// A limited number of trial requests are let through
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,
    /// Successes in half-open state before closing
    pub success_threshold: u32,
    /// Time spent open before allowing trial requests
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failures: u32,
    successes: u32,
    changed_at: Instant,
}

/// Consecutive-failure circuit breaker.
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                changed_at: Instant::now(),
            }),
            config,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned breaker still holds valid counters
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state, promoting Open to HalfOpen once the reset timeout passed.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.lock();
        self.promote(&mut inner);
        inner.state
    }

    /// Check if requests should be allowed
    pub fn allow_request(&self) -> bool {
        self.state() != CircuitState::Open
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => inner.failures = 0,
            CircuitState::HalfOpen => {
                inner.successes += 1;
                if inner.successes >= self.config.success_threshold {
                    Self::transition(&mut inner, CircuitState::Closed);
                    tracing::info!("Storage circuit breaker closed after successful recovery");
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failures += 1;
                if inner.failures >= self.config.failure_threshold {
                    let failures = inner.failures;
                    Self::transition(&mut inner, CircuitState::Open);
                    tracing::warn!(failures = failures, "Storage circuit breaker opened");
                }
            }
            CircuitState::HalfOpen => {
                Self::transition(&mut inner, CircuitState::Open);
                tracing::warn!("Storage circuit breaker reopened after failed trial request");
            }
            CircuitState::Open => inner.changed_at = Instant::now(),
        }
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let mut inner = self.lock();
        self.promote(&mut inner);
        CircuitBreakerStats {
            state: inner.state,
            failure_count: inner.failures,
        }
    }

    fn promote(&self, inner: &mut Inner) {
        if inner.state == CircuitState::Open && inner.changed_at.elapsed() >= self.config.reset_timeout
        {
            Self::transition(inner, CircuitState::HalfOpen);
            tracing::info!("Storage circuit breaker transitioning to half-open state");
        }
    }

    fn transition(inner: &mut Inner, state: CircuitState) {
        inner.state = state;
        inner.successes = 0;
        inner.changed_at = Instant::now();
        if state == CircuitState::Closed {
            inner.failures = 0;
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failure_threshold: u32, reset_ms: u64) -> CircuitBreaker {
        CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold,
            success_threshold: 2,
            reset_timeout: Duration::from_millis(reset_ms),
        })
    }

    #[test]
    fn test_initial_state() {
        let cb = CircuitBreaker::new();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = breaker(3, 10_000);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let cb = breaker(3, 10_000);

        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();

        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.stats().failure_count, 2);
    }

    #[test]
    fn test_half_open_then_closed() {
        let cb = breaker(1, 10);

        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let cb = breaker(1, 10);

        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_failure();
        assert_eq!(cb.stats().state.as_str(), "open");
    }
}

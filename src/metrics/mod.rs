//! Prometheus metrics for the queue service.
//!
//! - Queue operation counts and latency, labelled by operation and outcome
//! - Time spent waiting for a queue lock
//! - Slack Web API calls by method and outcome

mod helpers;

pub use helpers::{encode_metrics, QueueMetrics, SlackMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Histogram, HistogramVec,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "slackqueue";

lazy_static! {
    // ============================================================================
    // Queue Metrics
    // ============================================================================

    /// Queue operations by operation (join, leave, peek) and result
    pub static ref QUEUE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_queue_operations_total", METRIC_PREFIX),
        "Total queue operations",
        &["operation", "result"]
    ).unwrap();

    /// Store latency per operation, lock wait excluded
    pub static ref QUEUE_OPERATION_DURATION: HistogramVec = register_histogram_vec!(
        format!("{}_queue_operation_duration_seconds", METRIC_PREFIX),
        "Queue store operation latency in seconds",
        &["operation"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();

    /// Time spent waiting to acquire a queue lock
    pub static ref QUEUE_LOCK_WAIT: Histogram = register_histogram!(
        format!("{}_queue_lock_wait_seconds", METRIC_PREFIX),
        "Time spent waiting for a queue lock in seconds",
        vec![0.0001, 0.001, 0.01, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();

    // ============================================================================
    // Slack Metrics
    // ============================================================================

    /// Slack Web API requests by method and result
    pub static ref SLACK_API_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_slack_api_requests_total", METRIC_PREFIX),
        "Total Slack Web API requests",
        &["method", "result"]
    ).unwrap();
}

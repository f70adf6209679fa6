//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{QUEUE_LOCK_WAIT, QUEUE_OPERATIONS_TOTAL, QUEUE_OPERATION_DURATION, SLACK_API_REQUESTS_TOTAL};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

pub struct QueueMetrics;

impl QueueMetrics {
    /// Record the outcome of a queue operation ("ok" or an error kind)
    pub fn record_operation(operation: &str, result: &str, elapsed: Duration) {
        QUEUE_OPERATIONS_TOTAL
            .with_label_values(&[operation, result])
            .inc();
        QUEUE_OPERATION_DURATION
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_lock_wait(elapsed: Duration) {
        QUEUE_LOCK_WAIT.observe(elapsed.as_secs_f64());
    }
}

pub struct SlackMetrics;

impl SlackMetrics {
    pub fn record_request(method: &str, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        SLACK_API_REQUESTS_TOTAL
            .with_label_values(&[method, result])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_metrics_are_encoded() {
        QueueMetrics::record_operation("join", "ok", Duration::from_millis(3));
        QueueMetrics::record_lock_wait(Duration::from_micros(50));

        let output = encode_metrics().unwrap();
        assert!(output.contains("slackqueue_queue_operations_total"));
        assert!(output.contains("slackqueue_queue_lock_wait_seconds"));
    }

    #[test]
    fn test_slack_metrics_labels() {
        SlackMetrics::record_request("chat.postMessage", false);

        let count = SLACK_API_REQUESTS_TOTAL
            .with_label_values(&["chat.postMessage", "error"])
            .get();
        assert!(count >= 1);
    }
}

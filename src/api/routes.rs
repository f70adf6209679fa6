use axum::{
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::server::AppState;

use super::{health, oauth_callback, ping, prometheus_metrics, slack_events};

/// Slack payloads are small; anything larger is not from Slack.
const SLACK_BODY_LIMIT: usize = 64 * 1024;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/ping", get(ping))
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Slack
        .route("/oauth", get(oauth_callback))
        .route(
            "/slack",
            post(slack_events).layer(RequestBodyLimitLayer::new(SLACK_BODY_LIMIT)),
        )
}

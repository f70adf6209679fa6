use std::time::Duration;

use axum::Router;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::api::api_routes;

use super::AppState;

pub fn create_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.settings.server.request_timeout_seconds);

    Router::new()
        .merge(api_routes())
        // Add middleware
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        // Add state
        .with_state(state)
}

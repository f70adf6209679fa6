//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod oauth;
mod routes;
mod slack;

pub use health::{health, ping};
pub use metrics::prometheus_metrics;
pub use oauth::oauth_callback;
pub use routes::api_routes;
pub use slack::slack_events;

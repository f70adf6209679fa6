// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod postgres;
pub mod telemetry;

// Queue domain
pub mod queue;
pub mod token;

// Slack integration
pub mod bot;
pub mod slack;

// HTTP layer
pub mod api;
pub mod server;

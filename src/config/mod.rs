mod settings;

pub use settings::{
    DatabaseConfig, LockScope, OtelConfig, QueueBackendKind, QueueConfig, ServerConfig,
    Settings, SlackConfig,
};

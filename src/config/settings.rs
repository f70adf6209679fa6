use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a whole HTTP request, Slack round trips included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    /// Bot token for single-workspace installs (skips OAuth)
    pub token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Where `/oauth` redirects once the code exchange succeeded
    pub oauth_final_url: Option<String>,
    #[serde(default = "default_slack_api_base_url")]
    pub api_base_url: String,
    /// Optional text rendered in a context block under every queue message
    pub footer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; enables the durable backend when set
    pub url: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// Pool acquire timeout; must stay below `queue.operation_timeout_ms`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    #[serde(default = "default_cb_failure_threshold")]
    pub circuit_breaker_failure_threshold: u32,
    #[serde(default = "default_cb_reset_timeout")]
    pub circuit_breaker_reset_timeout_seconds: u64,
}

/// Which queue store to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackendKind {
    /// Postgres when `database.url` is set, memory otherwise
    #[default]
    Auto,
    Memory,
    Postgres,
}

/// Granularity of the lock serializing queue mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    /// One lock per queue id
    #[default]
    PerQueue,
    /// One lock for every queue in the process
    Global,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub backend: QueueBackendKind,
    #[serde(default)]
    pub lock_scope: LockScope,
    /// Deadline for a single store call while the queue lock is held
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
    /// Emit log lines as JSON instead of the human-readable format
    #[serde(default)]
    pub json_logs: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4578
}

fn default_request_timeout() -> u64 {
    15
}

fn default_slack_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    2
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_cb_failure_threshold() -> u32 {
    5
}

fn default_cb_reset_timeout() -> u64 {
    30
}

fn default_operation_timeout() -> u64 {
    5_000
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "slack-queue-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("slack.api_base_url", default_slack_api_base_url())?
            .set_default("queue.backend", "auto")?
            .set_default("queue.lock_scope", "per_queue")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // APP__SERVER__PORT, APP__QUEUE__LOCK_SCOPE, ...
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            // Variable names used by existing deployments
            .set_override_option("server.port", env::var("PORT").ok())?
            .set_override_option("slack.token", env::var("SLACK_TOKEN").ok())?
            .set_override_option("slack.client_id", env::var("SLACK_CLIENT_ID").ok())?
            .set_override_option("slack.client_secret", env::var("SLACK_CLIENT_SECRET").ok())?
            .set_override_option("slack.oauth_final_url", env::var("OAUTH_FINAL_URL").ok())?
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("otel.enabled", env::var("OTEL_ENABLED").ok())?
            .set_override_option("otel.endpoint", env::var("OTEL_ENDPOINT").ok())?
            .set_override_option("otel.json_logs", env::var("LOG_JSON").ok())?;

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject combinations the service cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_token = self.slack.token.as_deref().is_some_and(|t| !t.is_empty());
        let has_oauth = self.slack.client_id.is_some() && self.slack.client_secret.is_some();

        if !has_token && !has_oauth {
            return Err(ConfigError::Message(
                "Either SLACK_TOKEN or both SLACK_CLIENT_ID and SLACK_CLIENT_SECRET must be set"
                    .to_string(),
            ));
        }

        if has_oauth && self.slack.oauth_final_url.is_none() {
            return Err(ConfigError::Message(
                "OAUTH_FINAL_URL must be set when OAuth credentials are configured".to_string(),
            ));
        }

        if self.queue.backend == QueueBackendKind::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Message(
                "queue.backend = postgres requires DATABASE_URL".to_string(),
            ));
        }

        if self.queue.operation_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "queue.operation_timeout_ms must be greater than zero".to_string(),
            ));
        }

        let acquire_timeout_ms = self.database.connect_timeout_seconds.saturating_mul(1000);
        if self.database.url.is_some() && acquire_timeout_ms >= self.queue.operation_timeout_ms {
            return Err(ConfigError::Message(format!(
                "database.connect_timeout_seconds ({}s) must be shorter than queue.operation_timeout_ms ({}ms)",
                self.database.connect_timeout_seconds, self.queue.operation_timeout_ms
            )));
        }

        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl LockScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockScope::PerQueue => "per_queue",
            LockScope::Global => "global",
        }
    }
}

impl QueueConfig {
    /// Resolve `auto` against the database configuration.
    pub fn resolved_backend(&self, database: &DatabaseConfig) -> QueueBackendKind {
        match self.backend {
            QueueBackendKind::Auto if database.url.is_some() => QueueBackendKind::Postgres,
            QueueBackendKind::Auto => QueueBackendKind::Memory,
            other => other,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: None,
            client_id: None,
            client_secret: None,
            oauth_final_url: None,
            api_base_url: default_slack_api_base_url(),
            footer: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: default_pool_size(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            circuit_breaker_failure_threshold: default_cb_failure_threshold(),
            circuit_breaker_reset_timeout_seconds: default_cb_reset_timeout(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackendKind::default(),
            lock_scope: LockScope::default(),
            operation_timeout_ms: default_operation_timeout(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
            json_logs: false,
        }
    }
}

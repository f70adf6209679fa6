use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;

use slack_queue_service::bot::{OAuthInstaller, QueueBot};
use slack_queue_service::config::Settings;
use slack_queue_service::postgres::{CircuitBreaker, CircuitBreakerConfig, PostgresPool};
use slack_queue_service::queue::{create_queue_store, QueueService};
use slack_queue_service::server::{create_app, AppState};
use slack_queue_service::slack::SlackClient;
use slack_queue_service::telemetry::init_telemetry;
use slack_queue_service::token::create_token_store;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    let postgres_pool = match settings.database.url.as_deref() {
        Some(url) => {
            let breaker = Arc::new(CircuitBreaker::with_config(CircuitBreakerConfig {
                failure_threshold: settings.database.circuit_breaker_failure_threshold,
                reset_timeout: Duration::from_secs(
                    settings.database.circuit_breaker_reset_timeout_seconds,
                ),
                ..Default::default()
            }));
            let pool = PostgresPool::connect(&settings.database, url, breaker)
                .await
                .context("Failed to connect to PostgreSQL")?;
            pool.ensure_schema().await.context("Failed to create schema")?;
            Some(pool)
        }
        None => None,
    };

    let queue_store = create_queue_store(&settings.queue, &settings.database, postgres_pool.clone());
    let queue_service = Arc::new(QueueService::new(queue_store, &settings.queue));
    let token_store = create_token_store(postgres_pool.clone(), settings.slack.token.clone());

    // A token saved by an earlier OAuth install wins over the configured one
    let token = match token_store.get_token().await {
        Ok(Some(token)) => Some(token),
        Ok(None) => settings.slack.token.clone(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read stored token, using configured token");
            settings.slack.token.clone()
        }
    };

    let slack = Arc::new(SlackClient::new(&settings.slack.api_base_url, token)?);
    if slack.has_token().await {
        let auth = slack.auth_test().await.context("Slack token rejected")?;
        tracing::info!(team = %auth.team, user = %auth.user, "Authenticated with Slack");
        if let Err(e) = slack.set_active().await {
            tracing::warn!(error = %e, "Failed to mark bot user as active");
        }
    } else {
        tracing::info!("No Slack token yet, waiting for OAuth install");
    }

    let mut bot = QueueBot::new(queue_service, slack.clone()).with_footer(settings.slack.footer.clone());
    if let (Some(client_id), Some(client_secret)) =
        (settings.slack.client_id.clone(), settings.slack.client_secret.clone())
    {
        bot = bot.with_installer(OAuthInstaller {
            slack,
            token_store,
            client_id,
            client_secret,
        });
    }

    let state = AppState::new(settings.clone(), bot, postgres_pool.clone());
    tracing::info!("Application state initialized");

    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = postgres_pool {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

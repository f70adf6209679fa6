//! Slash commands and interactive components.

use axum::{extract::State, http::StatusCode, Form};

use crate::bot::BotError;
use crate::error::Result;
use crate::server::AppState;
use crate::slack::{SlackForm, SlackRequest};

/// POST /slack
///
/// Slack only needs a 200 to consider the request delivered; queue results
/// are posted back through the Web API.
pub async fn slack_events(
    State(state): State<AppState>,
    Form(form): Form<SlackForm>,
) -> Result<StatusCode> {
    let request = form.into_request().map_err(|e| {
        tracing::warn!(error = %e, "Failed to decode Slack payload");
        BotError::MalformedPayload(e.to_string())
    })?;

    match request {
        SlackRequest::Command(cmd) => state.bot.handle_command(cmd).await?,
        SlackRequest::Interaction(interaction) => state.bot.handle_interaction(interaction).await?,
    }

    Ok(StatusCode::OK)
}

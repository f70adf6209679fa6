//! OAuth install callback.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct OAuthQuery {
    pub code: Option<String>,
}

/// GET /oauth?code=...
///
/// Exchanges the one-time code and redirects to the configured landing page.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthQuery>,
) -> Result<Response> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing code parameter".to_string()))?;

    let final_url = state
        .settings
        .slack
        .oauth_final_url
        .clone()
        .ok_or_else(|| AppError::NotFound("OAuth is not configured".to_string()))?;

    state.bot.exchange_code_for_token(&code).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, final_url)]).into_response())
}

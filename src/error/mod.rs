use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::bot::BotError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Bot(#[from] BotError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

fn hide_in_production(detail: String, generic: &str) -> String {
    if is_production() {
        generic.to_string()
    } else {
        detail
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Bot(e) if e.is_bad_request() => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Bot(BotError::OAuthNotConfigured) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Bot(BotError::Slack(_)) => (StatusCode::BAD_GATEWAY, "SLACK_ERROR"),
            AppError::Bot(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let log_message = self.to_string();

        let client_message = if status.is_server_error() {
            hide_in_production(log_message.clone(), "Internal server error")
        } else {
            log_message.clone()
        };

        // Always log the detailed error server-side
        if status.is_server_error() {
            tracing::error!(code = %code, status = %status.as_u16(), message = %log_message, "API error");
        } else {
            tracing::warn!(code = %code, status = %status.as_u16(), message = %log_message, "API error");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{QueueServiceError, QueueStoreError};

    #[test]
    fn test_bot_errors_map_to_status() {
        let err = AppError::from(BotError::UnknownCommand("/dance".to_string()));
        assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);

        let err = AppError::from(BotError::NoActions);
        assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);

        let err = AppError::from(BotError::OAuthNotConfigured);
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::BadRequest("missing code".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::NotFound("OAuth is not configured".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let err = AppError::from(BotError::Queue(QueueServiceError::Store(
            QueueStoreError::Timeout(std::time::Duration::from_millis(5)),
        )));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

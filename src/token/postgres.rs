use async_trait::async_trait;

use crate::postgres::PostgresPool;

use super::{TokenStore, TokenStoreError};

/// Row id of the bot token in `oauth_tokens`.
const DEFAULT_TOKEN_ID: &str = "token";

/// Token persisted in the `oauth_tokens` table so installs survive restarts.
pub struct PostgresTokenStore {
    pool: PostgresPool,
    token_id: String,
}

impl PostgresTokenStore {
    pub fn new(pool: PostgresPool) -> Self {
        Self::with_token_id(pool, DEFAULT_TOKEN_ID)
    }

    pub fn with_token_id(pool: PostgresPool, token_id: impl Into<String>) -> Self {
        Self {
            pool,
            token_id: token_id.into(),
        }
    }
}

#[async_trait]
impl TokenStore for PostgresTokenStore {
    async fn get_token(&self) -> Result<Option<String>, TokenStoreError> {
        let token_id = self.token_id.clone();
        let token: Option<String> = self
            .pool
            .execute_with_circuit_breaker(|pool| async move {
                sqlx::query_scalar("SELECT token FROM oauth_tokens WHERE id = $1")
                    .bind(token_id)
                    .fetch_optional(&pool)
                    .await
            })
            .await?;

        Ok(token)
    }

    async fn set_token(&self, token: &str) -> Result<(), TokenStoreError> {
        let token_id = self.token_id.clone();
        let token = token.to_string();
        self.pool
            .execute_with_circuit_breaker(|pool| async move {
                sqlx::query(
                    r#"
                    INSERT INTO oauth_tokens (id, token, updated_at)
                    VALUES ($1, $2, NOW())
                    ON CONFLICT (id) DO UPDATE SET token = EXCLUDED.token, updated_at = NOW()
                    "#,
                )
                .bind(token_id)
                .bind(token)
                .execute(&pool)
                .await
            })
            .await?;

        tracing::info!(token_id = %self.token_id, "Slack token persisted");
        Ok(())
    }
}

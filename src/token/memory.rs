use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{TokenStore, TokenStoreError};

/// Token held in process memory, seeded from `SLACK_TOKEN`.
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get_token(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.token.read().await.clone())
    }

    async fn set_token(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }
}

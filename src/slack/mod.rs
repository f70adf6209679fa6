//! Slack integration: Web API client, request decoding and message rendering.

mod client;
pub mod payload;
pub mod render;

use async_trait::async_trait;
use serde_json::Value;

pub use client::{AuthTest, OAuthAccess, OAuthTeam, SlackClient, SlackError};
pub use payload::{Interaction, PayloadError, SlackForm, SlackRequest, SlashCommand};

/// The chat operations the bot needs.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn post_message(&self, channel: &str, blocks: Vec<Value>) -> Result<(), SlackError>;

    /// Replace the blocks of an existing message.
    async fn update_message(&self, channel: &str, ts: &str, blocks: Vec<Value>)
        -> Result<(), SlackError>;

    /// Message visible only to `user`.
    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str) -> Result<(), SlackError>;
}

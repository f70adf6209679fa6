//! Decoding of the form bodies Slack posts to `/slack`.
//!
//! Slash commands arrive as plain form fields. Button clicks arrive as a
//! single `payload` form field holding a JSON document.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Failed to parse interaction json: {0}")]
    InvalidInteraction(#[from] serde_json::Error),
}

/// Raw form body of a request to `/slack`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SlackForm {
    pub team_id: String,
    pub team_domain: String,
    pub channel_id: String,
    pub channel_name: String,
    pub user_id: String,
    pub user_name: String,
    pub command: String,
    pub text: String,
    pub response_url: String,
    pub trigger_id: String,

    /// Only present on interaction requests
    pub payload: Option<String>,
}

/// A decoded request from Slack.
#[derive(Debug, Clone)]
pub enum SlackRequest {
    Command(SlashCommand),
    Interaction(Interaction),
}

#[derive(Debug, Clone, Default)]
pub struct SlashCommand {
    pub command: String,
    pub text: String,
    pub channel_id: String,
    pub channel_name: String,
    pub user_id: String,
    pub user_name: String,
}

impl SlackForm {
    pub fn into_request(self) -> Result<SlackRequest, PayloadError> {
        match self.payload {
            Some(json) if !json.is_empty() => {
                let interaction = serde_json::from_str(&json)?;
                Ok(SlackRequest::Interaction(interaction))
            }
            _ => Ok(SlackRequest::Command(SlashCommand {
                command: self.command,
                text: self.text,
                channel_id: self.channel_id,
                channel_name: self.channel_name,
                user_id: self.user_id,
                user_name: self.user_name,
            })),
        }
    }
}

/// Block action payload (button click).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: InteractionUser,
    pub channel: InteractionChannel,
    pub container: Container,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InteractionUser {
    pub id: String,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InteractionChannel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Container {
    #[serde(rename = "type")]
    pub kind: String,
    pub message_ts: String,
    pub channel_id: String,
    pub is_ephemeral: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Action {
    pub action_id: String,
    pub block_id: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub action_ts: String,
}

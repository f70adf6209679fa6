//! Turns Slack requests into queue operations and posts the result back.
//!
//! Failures of the queue or of Slack itself are reported to the requesting
//! user as an ephemeral message and do not fail the HTTP request. Requests
//! the bot cannot interpret at all (unknown command, unknown action) are
//! returned as errors so the handler can answer 400.

use std::sync::Arc;

use thiserror::Error;

use crate::queue::{Item, QueueService, QueueServiceError};
use crate::slack::render::{self, ACTION_JOIN, ACTION_LEAVE};
use crate::slack::{ChatClient, Interaction, SlackClient, SlackError, SlashCommand};
use crate::token::{TokenStore, TokenStoreError};

const JOIN_COMMAND: &str = "/joinq";
const LEAVE_COMMAND: &str = "/leaveq";

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unrecognised action id: {0}")]
    UnknownAction(String),

    #[error("No actions found in interaction")]
    NoActions,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("OAuth is not configured")]
    OAuthNotConfigured,

    #[error(transparent)]
    Queue(#[from] QueueServiceError),

    #[error(transparent)]
    Slack(#[from] SlackError),

    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),
}

impl BotError {
    /// Errors caused by the request itself rather than by a backend.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::UnknownCommand(_) | Self::UnknownAction(_) | Self::NoActions | Self::MalformedPayload(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueAction {
    Join,
    Leave,
}

impl QueueAction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
        }
    }
}

/// What the bot needs to complete an OAuth install.
pub struct OAuthInstaller {
    pub slack: Arc<SlackClient>,
    pub token_store: Arc<dyn TokenStore>,
    pub client_id: String,
    pub client_secret: String,
}

pub struct QueueBot {
    queue_service: Arc<QueueService>,
    chat: Arc<dyn ChatClient>,
    installer: Option<OAuthInstaller>,
    footer: Option<String>,
}

impl QueueBot {
    pub fn new(queue_service: Arc<QueueService>, chat: Arc<dyn ChatClient>) -> Self {
        Self {
            queue_service,
            chat,
            installer: None,
            footer: None,
        }
    }

    pub fn with_installer(mut self, installer: OAuthInstaller) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn with_footer(mut self, footer: Option<String>) -> Self {
        self.footer = footer.filter(|f| !f.is_empty());
        self
    }

    pub fn queue_service(&self) -> &Arc<QueueService> {
        &self.queue_service
    }

    /// `/joinq` and `/leaveq`: run the operation and post a fresh queue
    /// message to the channel.
    #[tracing::instrument(
        name = "bot.command",
        skip(self, cmd),
        fields(command = %cmd.command, queue_id = %cmd.channel_id, user_id = %cmd.user_id)
    )]
    pub async fn handle_command(&self, cmd: SlashCommand) -> Result<(), BotError> {
        let action = match cmd.command.as_str() {
            JOIN_COMMAND => QueueAction::Join,
            LEAVE_COMMAND => QueueAction::Leave,
            other => return Err(BotError::UnknownCommand(other.to_string())),
        };

        tracing::info!(text = %cmd.text, "Handling slash command");

        let outcome = async {
            let queue = self
                .apply(action, &cmd.channel_id, Item::new(&cmd.user_id, &cmd.user_name))
                .await?;
            self.chat
                .post_message(&cmd.channel_id, self.blocks(&cmd.channel_id, &cmd.channel_name, &queue))
                .await?;
            Ok::<_, BotError>(())
        }
        .await;

        if let Err(e) = outcome {
            self.post_error(&cmd.channel_id, &cmd.user_id, &e).await;
        }
        Ok(())
    }

    /// Join/Leave buttons: run the operation, update the message the button
    /// belongs to and confirm privately.
    #[tracing::instrument(
        name = "bot.interaction",
        skip(self, interaction),
        fields(queue_id = %interaction.channel.id, user_id = %interaction.user.id)
    )]
    pub async fn handle_interaction(&self, interaction: Interaction) -> Result<(), BotError> {
        let first = interaction.actions.first().ok_or(BotError::NoActions)?;
        let action = match first.action_id.as_str() {
            ACTION_JOIN => QueueAction::Join,
            ACTION_LEAVE => QueueAction::Leave,
            other => {
                tracing::warn!(action_id = %other, "Unrecognised action id");
                return Err(BotError::UnknownAction(other.to_string()));
            }
        };

        let channel = &interaction.channel;
        let user = &interaction.user;
        tracing::info!(
            user_name = %user.name,
            action = action.as_str(),
            "Handling queue interaction"
        );

        let outcome = async {
            let queue = self
                .apply(action, &channel.id, Item::new(&user.id, &user.name))
                .await?;
            self.chat
                .update_message(
                    &channel.id,
                    &interaction.container.message_ts,
                    self.blocks(&channel.id, &channel.name, &queue),
                )
                .await?;
            Ok::<_, BotError>(queue)
        }
        .await;

        let queue = match outcome {
            Ok(queue) => queue,
            Err(e) => {
                self.post_error(&channel.id, &user.id, &e).await;
                return Ok(());
            }
        };

        match action {
            QueueAction::Join => {
                self.post_ephemeral(&channel.id, &user.id, "You have been added to the queue.")
                    .await;
            }
            QueueAction::Leave => {
                self.post_ephemeral(&channel.id, &user.id, "You have been removed from the queue.")
                    .await;
                if let Some(head) = queue.first() {
                    let text = format!(":fleur_de_lis: @{}, you're up!", head.user_name);
                    self.post_ephemeral(&channel.id, &head.user_id, &text).await;
                }
            }
        }
        Ok(())
    }

    /// Complete an OAuth install: trade the code for a token, persist it and
    /// start using it.
    #[tracing::instrument(name = "bot.oauth", skip(self, code))]
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<(), BotError> {
        let installer = self.installer.as_ref().ok_or(BotError::OAuthNotConfigured)?;

        let access = installer
            .slack
            .exchange_code(&installer.client_id, &installer.client_secret, code)
            .await?;
        tracing::info!(
            bot_user_id = access.bot_user_id.as_deref().unwrap_or_default(),
            "Exchanged OAuth code for token"
        );

        // A rejected token must not replace the working one
        let auth = installer.slack.auth_test_with(&access.access_token).await?;
        tracing::info!(team = %auth.team, user = %auth.user, "Authenticated with Slack");

        if let Err(e) = installer.token_store.set_token(&access.access_token).await {
            tracing::error!(error = %e, "Failed to save token to store");
        }
        installer.slack.set_token(access.access_token).await;

        installer.slack.set_active().await?;
        Ok(())
    }

    async fn apply(
        &self,
        action: QueueAction,
        queue_id: &str,
        item: Item,
    ) -> Result<Vec<Item>, QueueServiceError> {
        match action {
            QueueAction::Join => self.queue_service.join(queue_id, item).await,
            QueueAction::Leave => self.queue_service.leave(queue_id, item).await,
        }
    }

    fn blocks(&self, channel_id: &str, channel_name: &str, queue: &[Item]) -> Vec<serde_json::Value> {
        render::queue_blocks(channel_id, channel_name, queue, self.footer.as_deref())
    }

    async fn post_error(&self, channel: &str, user: &str, err: &BotError) {
        tracing::warn!(error = %err, "Queue request failed");
        self.post_ephemeral(channel, user, &err.to_string()).await;
    }

    /// Best effort: a failed ephemeral message is only logged.
    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str) {
        if let Err(e) = self.chat.post_ephemeral(channel, user, text).await {
            tracing::warn!(
                channel = %channel,
                user_id = %user,
                error = %e,
                "Failed to send ephemeral message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::sync::Mutex;

    use super::*;
    use crate::config::LockScope;
    use crate::queue::{MemoryQueueStore, QueueStore, QueueStoreError};
    use crate::slack::payload::{Action, InteractionChannel, InteractionUser};

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Message { channel: String, blocks: Vec<Value> },
        Update { channel: String, ts: String },
        Ephemeral { user: String, text: String },
    }

    #[derive(Default)]
    struct RecordingChat {
        sent: Mutex<Vec<Sent>>,
    }

    #[async_trait]
    impl ChatClient for RecordingChat {
        async fn post_message(&self, channel: &str, blocks: Vec<Value>) -> Result<(), SlackError> {
            self.sent.lock().await.push(Sent::Message {
                channel: channel.to_string(),
                blocks,
            });
            Ok(())
        }

        async fn update_message(&self, channel: &str, ts: &str, _: Vec<Value>) -> Result<(), SlackError> {
            self.sent.lock().await.push(Sent::Update {
                channel: channel.to_string(),
                ts: ts.to_string(),
            });
            Ok(())
        }

        async fn post_ephemeral(&self, _: &str, user: &str, text: &str) -> Result<(), SlackError> {
            self.sent.lock().await.push(Sent::Ephemeral {
                user: user.to_string(),
                text: text.to_string(),
            });
            Ok(())
        }
    }

    fn bot() -> (QueueBot, Arc<RecordingChat>) {
        let service = Arc::new(QueueService::with_options(
            Arc::new(MemoryQueueStore::new()),
            LockScope::PerQueue,
            Duration::from_secs(1),
        ));
        let chat = Arc::new(RecordingChat::default());
        (QueueBot::new(service, chat.clone()), chat)
    }

    /// Store that behaves like a database behind an open circuit breaker.
    struct UnavailableStore;

    #[async_trait]
    impl QueueStore for UnavailableStore {
        fn backend_name(&self) -> &'static str {
            "unavailable"
        }

        async fn enqueue(&self, _: &str, _: Item) -> Result<Vec<Item>, QueueStoreError> {
            Err(QueueStoreError::Unavailable("Circuit breaker is open".to_string()))
        }

        async fn dequeue(&self, _: &str, _: &Item) -> Result<Vec<Item>, QueueStoreError> {
            Err(QueueStoreError::Unavailable("Circuit breaker is open".to_string()))
        }

        async fn snapshot(&self, _: &str) -> Result<Vec<Item>, QueueStoreError> {
            Err(QueueStoreError::Unavailable("Circuit breaker is open".to_string()))
        }
    }

    fn command(name: &str, user_id: &str, user_name: &str) -> SlashCommand {
        SlashCommand {
            command: name.to_string(),
            channel_id: "C1".to_string(),
            channel_name: "general".to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            ..Default::default()
        }
    }

    fn click(action_id: &str, user_id: &str, user_name: &str) -> Interaction {
        Interaction {
            kind: "block_actions".to_string(),
            user: InteractionUser {
                id: user_id.to_string(),
                name: user_name.to_string(),
                ..Default::default()
            },
            channel: InteractionChannel {
                id: "C1".to_string(),
                name: "general".to_string(),
            },
            container: crate::slack::payload::Container {
                message_ts: "1.2".to_string(),
                ..Default::default()
            },
            actions: vec![Action {
                action_id: action_id.to_string(),
                value: "C1".to_string(),
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn test_join_command_posts_queue() {
        let (bot, chat) = bot();

        bot.handle_command(command("/joinq", "U1", "alice")).await.unwrap();

        let sent = chat.sent.lock().await;
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Sent::Message { channel, blocks } => {
                assert_eq!(channel, "C1");
                assert_eq!(blocks[2]["text"]["text"], ":first_place_medal: @alice\n");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_leave_command_when_absent_reports_error() {
        let (bot, chat) = bot();

        bot.handle_command(command("/leaveq", "U1", "alice")).await.unwrap();

        let sent = chat.sent.lock().await;
        assert_eq!(
            sent.as_slice(),
            &[Sent::Ephemeral {
                user: "U1".to_string(),
                text: "user (U1) not found in queue with id: C1".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_storage_error_reaches_user() {
        let service = Arc::new(QueueService::with_options(
            Arc::new(UnavailableStore),
            LockScope::PerQueue,
            Duration::from_secs(1),
        ));
        let chat = Arc::new(RecordingChat::default());
        let bot = QueueBot::new(service, chat.clone());

        bot.handle_command(command("/joinq", "U1", "alice")).await.unwrap();
        bot.handle_interaction(click(ACTION_LEAVE, "U1", "alice")).await.unwrap();

        let expected = Sent::Ephemeral {
            user: "U1".to_string(),
            text: "Backend unavailable: Circuit breaker is open".to_string(),
        };
        let sent = chat.sent.lock().await;
        assert_eq!(sent.as_slice(), &[expected.clone(), expected]);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let (bot, chat) = bot();

        let err = bot.handle_command(command("/dance", "U1", "alice")).await.unwrap_err();

        assert!(matches!(err, BotError::UnknownCommand(ref c) if c == "/dance"));
        assert!(err.is_bad_request());
        assert!(chat.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_join_click_updates_and_confirms() {
        let (bot, chat) = bot();

        bot.handle_interaction(click(ACTION_JOIN, "U1", "alice")).await.unwrap();

        let sent = chat.sent.lock().await;
        assert_eq!(
            sent.as_slice(),
            &[
                Sent::Update {
                    channel: "C1".to_string(),
                    ts: "1.2".to_string(),
                },
                Sent::Ephemeral {
                    user: "U1".to_string(),
                    text: "You have been added to the queue.".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_leave_click_notifies_new_head() {
        let (bot, chat) = bot();
        bot.handle_interaction(click(ACTION_JOIN, "U1", "alice")).await.unwrap();
        bot.handle_interaction(click(ACTION_JOIN, "U2", "bob")).await.unwrap();
        chat.sent.lock().await.clear();

        bot.handle_interaction(click(ACTION_LEAVE, "U1", "alice")).await.unwrap();

        let sent = chat.sent.lock().await;
        assert_eq!(sent.len(), 3);
        assert_eq!(
            sent[2],
            Sent::Ephemeral {
                user: "U2".to_string(),
                text: ":fleur_de_lis: @bob, you're up!".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_join_click_twice_reports_already_queued() {
        let (bot, chat) = bot();
        bot.handle_interaction(click(ACTION_JOIN, "U1", "alice")).await.unwrap();
        chat.sent.lock().await.clear();

        bot.handle_interaction(click(ACTION_JOIN, "U1", "alice")).await.unwrap();

        let sent = chat.sent.lock().await;
        assert_eq!(
            sent.as_slice(),
            &[Sent::Ephemeral {
                user: "U1".to_string(),
                text: "user (U1) is already in queue with id: C1".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_interaction_without_actions() {
        let (bot, _) = bot();
        let mut interaction = click(ACTION_JOIN, "U1", "alice");
        interaction.actions.clear();

        let err = bot.handle_interaction(interaction).await.unwrap_err();
        assert!(matches!(err, BotError::NoActions));
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let (bot, _) = bot();

        let err = bot
            .handle_interaction(click("dance", "U1", "alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::UnknownAction(_)));
    }

    #[tokio::test]
    async fn test_oauth_without_installer() {
        let (bot, _) = bot();

        let err = bot.exchange_code_for_token("abc").await.unwrap_err();
        assert!(matches!(err, BotError::OAuthNotConfigured));
    }
}

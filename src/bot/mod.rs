//! Slash command and interaction handling.

mod dispatcher;

pub use dispatcher::{BotError, OAuthInstaller, QueueBot};

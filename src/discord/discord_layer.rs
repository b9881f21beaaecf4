// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "moderation/mod.rs"]
pub mod moderation;

use crate::core::age_check::{AgeCheckService, ChannelPolicy};
use crate::core::ai::{CredentialPool, RemoteClassifier, UsageTracker};
use crate::core::cases::CaseLog;
use crate::infra::ai::ChatCompletionsClient;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event handler.
pub struct Data {
    pub age_check: Arc<AgeCheckService<RemoteClassifier<ChatCompletionsClient>>>,
    pub pool: Arc<CredentialPool>,
    pub usage: Arc<UsageTracker>,
    pub cases: Arc<CaseLog>,
    pub channels: ChannelPolicy,
    pub mod_log_channel_id: u64,
}

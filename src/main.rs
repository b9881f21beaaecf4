// This is the entry point of the age gate bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (remote APIs)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::age_check::AgeCheckService;
use crate::core::ai::{AiConfig, CredentialPool, PoolPolicy, RemoteClassifier, UsageTracker};
use crate::core::cases::CaseLog;
use crate::discord::commands::presence;
use crate::discord::moderation::{age_gate_handler, case_actions, usage_alerts};
use crate::discord::{Data, Error};
use crate::infra::ai::ChatCompletionsClient;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) =
                age_gate_handler::handle_message_for_age_check(ctx, new_message, data).await
            {
                tracing::error!(message_id = new_message.id.get(), "Age check failed: {}", e);
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let Err(e) = case_actions::handle_interaction(ctx, interaction, data).await {
                tracing::error!("Error handling case action: {}", e);
            }
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening (RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let pool = Arc::new(CredentialPool::new(
        config.api_keys.clone(),
        PoolPolicy::default(),
    ));
    if pool.is_empty() {
        tracing::warn!("No AI credentials configured; remote classification is disabled");
    }

    let usage = Arc::new(UsageTracker::new(config.budget));
    let (usage_tx, usage_rx) = tokio::sync::mpsc::unbounded_channel();

    let ai_config = AiConfig {
        model: config.ai_model.clone(),
        ..AiConfig::default()
    };
    let remote = RemoteClassifier::new(
        ChatCompletionsClient::new(config.ai_endpoint.clone()),
        ai_config,
        Arc::clone(&pool),
        Arc::clone(&usage),
    )
    .with_call_timeout(config.call_timeout)
    .with_usage_alerts(usage_tx);

    let age_check = Arc::new(AgeCheckService::new(config.strategy, remote));

    tracing::info!(
        guild = config.channels.guild_id,
        strategy = %config.strategy,
        credentials = pool.len(),
        attachment_channels = config.channels.attachment_channels.len(),
        "Age gate configured"
    );

    let guild_id = serenity::GuildId::new(config.channels.guild_id);
    let mod_log_channel_id = config.mod_log_channel_id;

    // Create the data structure that will be shared across all commands
    let data = Data {
        age_check,
        pool,
        usage,
        cases: Arc::new(CaseLog::new()),
        channels: config.channels,
        mod_log_channel_id,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![discord::commands::ai_status::ai_status()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                // Only one guild is moderated, so guild registration is immediate.
                poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                    .await?;
                tracing::info!("Commands registered");

                presence::on_ready(ctx);
                usage_alerts::post_startup_status(&ctx.http, &data).await;
                usage_alerts::spawn_alert_loop(ctx.http.clone(), mod_log_channel_id, usage_rx);

                tracing::info!("Bot is ready");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}

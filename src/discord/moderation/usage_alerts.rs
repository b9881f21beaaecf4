// Usage alerts and the startup status post in the moderation log channel.

use crate::core::age_check::DetectionStrategy;
use crate::core::ai::{PoolHealth, UsageEvent, UsageSnapshot};
use crate::discord::Data;
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateEmbedFooter};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;

const ORANGE: (u8, u8, u8) = (255, 165, 0);
const RED: (u8, u8, u8) = (237, 66, 69);
const GREEN: (u8, u8, u8) = (67, 181, 129);

pub fn usage_state_label(usage: &UsageSnapshot) -> &'static str {
    if usage.exhausted {
        "Limit reached (patterns only)"
    } else if usage.is_warning() {
        "Warning"
    } else {
        "Active"
    }
}

pub fn format_budget(usage: &UsageSnapshot) -> String {
    match usage.budget_limit {
        Some(limit) => format!("{} / {}", usage.requests, limit),
        None => format!("{} (no limit)", usage.requests),
    }
}

pub fn build_usage_alert(event: &UsageEvent) -> CreateEmbed {
    let (title, description, rgb) = match *event {
        UsageEvent::WarningReached { requests, limit } => (
            "⚠️ AI Usage Warning",
            match limit {
                Some(limit) => format!(
                    "{requests} remote requests used, {} left before the limit of {limit}.",
                    limit.saturating_sub(requests)
                ),
                None => format!("{requests} remote requests used."),
            },
            ORANGE,
        ),
        UsageEvent::LimitReached { requests } => (
            "🛑 AI Usage Limit Reached",
            format!(
                "{requests} remote requests used. Age checks now run on patterns only until restart."
            ),
            RED,
        ),
        UsageEvent::QuotaExhausted { requests } => (
            "🛑 AI Quota Exhausted",
            format!(
                "Every credential reported an exhausted quota after {requests} requests. \
                 Age checks now run on patterns only until restart."
            ),
            RED,
        ),
    };

    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(serenity::Colour::from_rgb(rgb.0, rgb.1, rgb.2))
        .timestamp(serenity::Timestamp::now())
}

pub fn build_startup_embed(
    strategy: DetectionStrategy,
    model: &str,
    health: &PoolHealth,
    usage: &UsageSnapshot,
) -> CreateEmbed {
    CreateEmbed::new()
        .title("✅ Age Gate Online")
        .color(serenity::Colour::from_rgb(GREEN.0, GREEN.1, GREEN.2))
        .field("Strategy", strategy.to_string(), true)
        .field("Model", model, true)
        .field("Credentials", health.total.to_string(), true)
        .field("Usage Budget", format_budget(usage), true)
        .footer(CreateEmbedFooter::new("Watching age checks"))
        .timestamp(serenity::Timestamp::now())
}

pub async fn post_startup_status(http: &serenity::Http, data: &Data) {
    let health = data.pool.health(Instant::now()).await;
    let embed = build_startup_embed(
        data.age_check.strategy(),
        data.age_check.remote().model(),
        &health,
        &data.usage.snapshot(),
    );

    if let Err(e) = serenity::ChannelId::new(data.mod_log_channel_id)
        .send_message(http, serenity::CreateMessage::new().embed(embed))
        .await
    {
        tracing::warn!(
            channel_id = data.mod_log_channel_id,
            error = %e,
            "Failed to post startup status"
        );
    }
}

/// Post every usage event into the moderation log channel until the sender is dropped.
pub fn spawn_alert_loop(
    http: Arc<serenity::Http>,
    channel_id: u64,
    mut events: UnboundedReceiver<UsageEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::warn!(?event, "AI usage threshold crossed");
            let message = serenity::CreateMessage::new().embed(build_usage_alert(&event));
            if let Err(e) = serenity::ChannelId::new(channel_id)
                .send_message(&http, message)
                .await
            {
                tracing::warn!(channel_id, error = %e, "Failed to post usage alert");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(requests: u64, exhausted: bool) -> UsageSnapshot {
        UsageSnapshot {
            requests,
            budget_warning: Some(8),
            budget_limit: Some(10),
            exhausted,
        }
    }

    #[test]
    fn test_usage_state_label() {
        assert_eq!(usage_state_label(&snapshot(3, false)), "Active");
        assert_eq!(usage_state_label(&snapshot(8, false)), "Warning");
        assert_eq!(
            usage_state_label(&snapshot(10, true)),
            "Limit reached (patterns only)"
        );
    }

    #[test]
    fn test_format_budget() {
        assert_eq!(format_budget(&snapshot(3, false)), "3 / 10");

        let unlimited = UsageSnapshot {
            budget_limit: None,
            ..snapshot(3, false)
        };
        assert_eq!(format_budget(&unlimited), "3 (no limit)");
    }
}

use crate::discord::moderation::usage_alerts::{format_budget, usage_state_label};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use std::time::Instant;

/// Show remote classifier usage, credential health and the detection strategy.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    rename = "aistatus"
)]
pub async fn ai_status(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let usage = data.usage.snapshot();
    let health = data.pool.health(Instant::now()).await;

    let remaining = usage
        .remaining()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "Unlimited".to_string());

    let color = if usage.exhausted {
        serenity::Colour::from_rgb(237, 66, 69)
    } else if usage.is_warning() {
        serenity::Colour::from_rgb(255, 165, 0)
    } else {
        serenity::Colour::from_rgb(67, 181, 129)
    };

    let embed = serenity::CreateEmbed::default()
        .title("AI Classifier Status")
        .color(color)
        .field("Model", data.age_check.remote().model(), true)
        .field("Strategy", data.age_check.strategy().to_string(), true)
        .field("State", usage_state_label(&usage), true)
        .field("Requests", format_budget(&usage), true)
        .field("Remaining", remaining, true)
        .field(
            "Credentials",
            format!(
                "{} available / {} cooling down ({} total)",
                health.available, health.cooling_down, health.total
            ),
            false,
        )
        .field(
            "Calls",
            format!(
                "{} succeeded / {} failed",
                health.total_successes, health.total_failures
            ),
            true,
        )
        .field("Open Cases", data.cases.open_count().to_string(), true)
        .timestamp(serenity::Timestamp::now());

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

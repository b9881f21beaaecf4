// Ban / ignore buttons on case embeds in the moderation log.

use crate::core::cases::{CaseAction, MinorCase};
use crate::discord::moderation::case_embed::{build_case_embed, parse_case_action};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Days of the user's message history removed along with the ban.
const BAN_DELETE_MESSAGE_DAYS: u8 = 1;

/// Handle a component interaction if it is one of our case buttons.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) -> Result<(), Error> {
    let Some(component) = interaction.as_message_component() else {
        return Ok(());
    };
    let Some((action, case_id)) = parse_case_action(&component.data.custom_id) else {
        return Ok(());
    };

    let can_ban = component
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .is_some_and(|p| p.ban_members());
    if !can_ban {
        return reply_ephemeral(
            ctx,
            component,
            "You need the Ban Members permission to handle age check cases.",
        )
        .await;
    }

    let moderator_id = component.user.id.get();
    let case = match data.cases.resolve(case_id, action, moderator_id) {
        Ok(case) => case,
        Err(e) => return reply_ephemeral(ctx, component, &e.to_string()).await,
    };

    if action == CaseAction::Ban {
        if let Err(e) = ban_user(ctx, &case).await {
            tracing::error!(case_id, user_id = case.user_id, error = %e, "Failed to ban user");
            data.cases.reopen(case_id);
            return reply_ephemeral(ctx, component, &format!("Ban failed: {e}")).await;
        }
    }

    tracing::info!(
        case_id,
        moderator_id,
        outcome = %case.status,
        "Case resolved"
    );

    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(build_case_embed(&case))
                    .components(vec![]), // Empty components to remove the buttons
            ),
        )
        .await?;
    Ok(())
}

async fn ban_user(ctx: &serenity::Context, case: &MinorCase) -> Result<(), serenity::Error> {
    let reason = format!("Age check: suspected minor ({})", case.reason);
    serenity::GuildId::new(case.guild_id)
        .ban_with_reason(
            &ctx.http,
            serenity::UserId::new(case.user_id),
            BAN_DELETE_MESSAGE_DAYS,
            reason,
        )
        .await
}

async fn reply_ephemeral(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    content: &str,
) -> Result<(), Error> {
    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

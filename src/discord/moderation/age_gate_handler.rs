// Discord-specific age gate handling - translates core decisions to Discord actions.

use crate::core::age_check::{AttachmentInfo, InboundEvent};
use crate::core::cases::NewCase;
use crate::discord::moderation::case_embed::{build_case_embed, case_buttons};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Copy the primitives the core needs out of a serenity message.
pub fn inbound_event(msg: &serenity::Message) -> InboundEvent {
    InboundEvent {
        author_is_bot: msg.author.bot,
        guild_id: msg.guild_id.map(|id| id.get()),
        channel_id: msg.channel_id.get(),
        text: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| AttachmentInfo {
                content_type: a.content_type.clone(),
                filename: a.filename.clone(),
            })
            .collect(),
    }
}

/// Run the age check on a message and apply the decision.
///
/// Returns `true` if the message was deleted.
pub async fn handle_message_for_age_check(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<bool, Error> {
    let Some(message) = data.channels.admit(&inbound_event(msg)) else {
        return Ok(false);
    };

    let decision = data.age_check.decide(&message).await;

    tracing::info!(
        guild = data.channels.guild_id,
        channel = msg.channel_id.get(),
        author = msg.author.id.get(),
        decision = %decision,
        reason = decision.reason(),
        confidence = %decision.confidence(),
        "Age check decision"
    );

    if !decision.should_delete() {
        return Ok(false);
    }

    if let Err(e) = msg.delete(&ctx.http).await {
        tracing::warn!(
            message_id = msg.id.get(),
            error = %e,
            "Failed to delete message that failed the age check"
        );
    }

    if decision.is_confirmed_minor() {
        open_case(ctx, msg, data, decision.apparent_age(), decision.reason()).await;
    }

    Ok(true)
}

async fn open_case(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
    apparent_age: Option<u8>,
    reason: &str,
) {
    let case = data.cases.open(NewCase {
        message_id: msg.id.get(),
        guild_id: data.channels.guild_id,
        channel_id: msg.channel_id.get(),
        user_id: msg.author.id.get(),
        user_name: msg.author.name.clone(),
        content: msg.content.clone(),
        apparent_age,
        reason: reason.to_string(),
    });

    tracing::info!(
        case_id = case.case_id,
        author = case.user_id,
        apparent_age = ?case.apparent_age,
        "Opened suspected-minor case"
    );

    let log_channel = serenity::ChannelId::new(data.mod_log_channel_id);
    let message = serenity::CreateMessage::new()
        .embed(build_case_embed(&case))
        .components(case_buttons(case.case_id));

    if let Err(e) = log_channel.send_message(&ctx.http, message).await {
        tracing::error!(
            case_id = case.case_id,
            channel_id = data.mod_log_channel_id,
            error = %e,
            "Failed to post case to moderation log"
        );
    }
}

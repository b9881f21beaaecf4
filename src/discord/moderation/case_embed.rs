use crate::core::cases::{CaseAction, CaseStatus, MinorCase};
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateEmbedFooter};

const CUSTOM_ID_PREFIX: &str = "agecheck";
const MAX_CONTENT_CHARS: usize = 1000;

pub fn button_id(action: CaseAction, case_id: u64) -> String {
    let verb = match action {
        CaseAction::Ban => "ban",
        CaseAction::Ignore => "ignore",
    };
    format!("{CUSTOM_ID_PREFIX}:{verb}:{case_id}")
}

/// Inverse of [`button_id`]. `None` for buttons that belong to someone else.
pub fn parse_case_action(custom_id: &str) -> Option<(CaseAction, u64)> {
    let mut parts = custom_id.split(':');
    if parts.next()? != CUSTOM_ID_PREFIX {
        return None;
    }
    let action = match parts.next()? {
        "ban" => CaseAction::Ban,
        "ignore" => CaseAction::Ignore,
        _ => return None,
    };
    let case_id = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((action, case_id))
}

pub fn case_buttons(case_id: u64) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(button_id(CaseAction::Ban, case_id))
            .label("Ban")
            .style(serenity::ButtonStyle::Danger),
        serenity::CreateButton::new(button_id(CaseAction::Ignore, case_id))
            .label("Ignore")
            .style(serenity::ButtonStyle::Secondary),
    ])]
}

pub fn build_case_embed(case: &MinorCase) -> CreateEmbed {
    let (title, color) = match case.status {
        CaseStatus::Open => ("🚨 Suspected Minor", serenity::Colour::from_rgb(237, 66, 69)),
        CaseStatus::Banned { .. } => ("🔨 Suspected Minor - Banned", serenity::Colour::from_rgb(128, 0, 0)),
        CaseStatus::Ignored { .. } => ("Suspected Minor - Ignored", serenity::Colour::from_rgb(128, 128, 128)),
    };

    let age = case
        .apparent_age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let timestamp = serenity::Timestamp::from_unix_timestamp(case.created_at.timestamp())
        .unwrap_or_else(|_| serenity::Timestamp::now());

    let mut embed = CreateEmbed::new()
        .title(title)
        .color(color)
        .field("User", format!("<@{}> (`{}`)", case.user_id, case.user_name), true)
        .field("Channel", format!("<#{}>", case.channel_id), true)
        .field("Apparent Age", age, true)
        .field("Reason", format!("`{}`", case.reason), true)
        .field("Message", truncate_content(&case.content), false)
        .footer(CreateEmbedFooter::new(format!("Case {}", case.case_id)))
        .timestamp(timestamp);

    match case.status {
        CaseStatus::Open => {}
        CaseStatus::Banned { moderator_id } => {
            embed = embed.field("Outcome", format!("Banned by <@{moderator_id}>"), false);
        }
        CaseStatus::Ignored { moderator_id } => {
            embed = embed.field("Outcome", format!("Ignored by <@{moderator_id}>"), false);
        }
    }

    embed
}

fn truncate_content(content: &str) -> String {
    if content.trim().is_empty() {
        return "*(no text)*".to_string();
    }
    if content.chars().count() <= MAX_CONTENT_CHARS {
        return content.to_string();
    }
    let mut truncated: String = content.chars().take(MAX_CONTENT_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}

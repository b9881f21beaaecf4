// This module handles bot presence and lifecycle events.
//
// Everything here is Discord-layer glue. We only work with Discord SDK types
// (Context, ActivityData, OnlineStatus) and keep the logic short.

use poise::serenity_prelude as serenity;

const DEFAULT_ACTIVITY: &str = "age checks";

/// Resets the bot's status to the default message.
pub fn reset_status(ctx: &serenity::Context) {
    // serenity 0.12 exposes builder helpers on ActivityData, not Activity.
    let activity = serenity::ActivityData::watching(DEFAULT_ACTIVITY);
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Called once the bot is ready.
pub fn on_ready(ctx: &serenity::Context) {
    reset_status(ctx);
}

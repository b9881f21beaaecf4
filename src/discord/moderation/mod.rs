// Discord-side age gate: message handling, case embeds and moderator actions.

pub mod age_gate_handler;
pub mod case_actions;
pub mod case_embed;
pub mod usage_alerts;

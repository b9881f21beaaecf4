// Inbound boundary - which gateway messages get an age check at all.
//
// The Discord layer copies primitives out of serenity's `Message` into an
// `InboundEvent`; this module filters and converts it without touching the
// Discord SDK.

use super::age_check_models::{ChannelKind, ModerationMessage};
use super::attachment_gate::{has_qualifying_attachment, AttachmentInfo};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub author_is_bot: bool,
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub text: String,
    pub attachments: Vec<AttachmentInfo>,
}

/// Which guild is moderated and which of its channels require media.
#[derive(Debug, Clone)]
pub struct ChannelPolicy {
    pub guild_id: u64,
    pub attachment_channels: HashSet<u64>,
}

impl ChannelPolicy {
    pub fn channel_kind(&self, channel_id: u64) -> ChannelKind {
        if self.attachment_channels.contains(&channel_id) {
            ChannelKind::AttachmentRequired
        } else {
            ChannelKind::Ordinary
        }
    }

    /// `None` for bots, DMs and other guilds.
    pub fn admit(&self, event: &InboundEvent) -> Option<ModerationMessage> {
        if event.author_is_bot || event.guild_id != Some(self.guild_id) {
            return None;
        }

        Some(ModerationMessage {
            text: event.text.clone(),
            has_qualifying_attachment: has_qualifying_attachment(&event.attachments),
            channel_kind: self.channel_kind(event.channel_id),
        })
    }
}

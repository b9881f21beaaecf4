// Attachment gate - does a message carry an image or a video?

const MEDIA_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".mp4", ".mov", ".webm",
];

/// Platform-neutral view of one attachment.
#[derive(Debug, Clone, Default)]
pub struct AttachmentInfo {
    pub content_type: Option<String>,
    pub filename: String,
}

/// True when at least one attachment is an image or a video. The reported
/// content type wins; the file extension is only a fallback.
pub fn has_qualifying_attachment(attachments: &[AttachmentInfo]) -> bool {
    attachments.iter().any(is_media)
}

fn is_media(attachment: &AttachmentInfo) -> bool {
    match attachment.content_type.as_deref() {
        Some(content_type) => {
            let content_type = content_type.to_ascii_lowercase();
            content_type.starts_with("image/") || content_type.starts_with("video/")
        }
        None => {
            let name = attachment.filename.to_ascii_lowercase();
            MEDIA_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
        }
    }
}

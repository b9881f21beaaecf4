// Prompt and response schema for remote age classification.
//
// The model must answer with one JSON object:
//   {"has_age_18_plus": bool, "is_minor": bool, "age": int|null,
//    "confidence": "high"|"medium"|"low", "reason": string}
// Anything that does not deserialize into that shape is a parse failure and
// gets retried like a transport error.

use super::models::{AiMessage, ProviderError};
use crate::core::age_check::{ChannelKind, Confidence, DetectionVerdict};
use crate::core::age_check::patterns::{ADULT_AGE, MAX_PLAUSIBLE_AGE};
use serde::Deserialize;

pub const SCHEMA_VERSION: u32 = 1;

/// Only the start of a message is sent to the model.
const MAX_PROMPT_CHARS: usize = 300;

pub const REASON_REMOTE_MINOR: &str = "remote-minor";
pub const REASON_REMOTE_ADULT: &str = "remote-adult";
pub const REASON_REMOTE_NO_AGE: &str = "remote-no-age";
pub const REASON_REMOTE_CONTRADICTORY: &str = "remote-contradictory";
pub const REASON_REMOTE_INVALID_AGE: &str = "remote-invalid-age";
pub const REASON_REMOTE_LOW_CONFIDENCE: &str = "remote-low-confidence";

const SYSTEM_PROMPT: &str = r#"You moderate an 18+ community. Decide whether the AUTHOR of a message states their OWN age as 18 or older.

Rules:
- Only the sender's own declared age counts. Ignore ages the sender is looking for ("looking for 20-30"), body measurements ("7 inch", "18cm"), sizes, prices and counts.
- Ages 18 to 70 are adult. Ages above 70 or below 1 are not real ages: treat them as no age stated.
- Ages 1 to 17, or phrases like "underage", "u18", "minor", "in high school", mean the sender is a minor.
- Reversed codes: "41", "51", "61", "71", "81", "91" followed or preceded by a reversal marker ("reversed", "swap", "swapped", "inverted", "flipped", or an arrow emoji such as 🔄) mean the digits are swapped: 51 reversed = 15 (minor), 81 reversed = 18 (adult). Without a marker they are plain numbers.
- Gender shorthand: "22m", "19 f" state an age of 22 and 19.
- If you are not sure, answer has_age_18_plus=false, is_minor=false, confidence="low".

Respond with ONLY this JSON object and nothing else:
{"has_age_18_plus": true|false, "is_minor": true|false, "age": number or null, "confidence": "high"|"medium"|"low", "reason": "short explanation"}"#;

#[derive(Debug, Deserialize)]
struct AgeResponse {
    has_age_18_plus: bool,
    is_minor: bool,
    #[serde(default)]
    age: Option<i64>,
    confidence: Confidence,
    #[serde(default)]
    reason: String,
}

/// Build the system + user messages for one classification.
pub fn build_messages(text: &str, channel_kind: ChannelKind) -> Vec<AiMessage> {
    let excerpt: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    let channel = match channel_kind {
        ChannelKind::Ordinary => "text channel",
        ChannelKind::AttachmentRequired => "media channel (post includes a picture or video)",
    };

    vec![
        AiMessage::system(SYSTEM_PROMPT),
        AiMessage::user(format!("Channel: {}\nMessage: {}", channel, excerpt)),
    ]
}

/// Pull the JSON object out of the model output. Models like to wrap it in
/// code fences or add a sentence around it.
fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Validate a model response against the schema and turn it into a verdict.
pub fn parse_verdict(content: &str) -> Result<DetectionVerdict, ProviderError> {
    let json = extract_json_object(content)
        .ok_or_else(|| ProviderError::Parse("no JSON object in response".to_string()))?;
    let response: AgeResponse =
        serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))?;

    tracing::debug!(
        schema = SCHEMA_VERSION,
        has_age_18_plus = response.has_age_18_plus,
        is_minor = response.is_minor,
        age = ?response.age,
        confidence = %response.confidence,
        reason = %response.reason,
        "Remote age verdict"
    );

    let verdict = match (response.has_age_18_plus, response.is_minor) {
        (true, true) => DetectionVerdict::uncertain(REASON_REMOTE_CONTRADICTORY),
        (false, true) => {
            let age = response
                .age
                .filter(|a| (1..ADULT_AGE as i64).contains(a))
                .and_then(|a| u8::try_from(a).ok());
            DetectionVerdict::minor(age, REASON_REMOTE_MINOR).with_confidence(response.confidence)
        }
        (true, false) => match response.age {
            Some(age) if !(ADULT_AGE as i64..=MAX_PLAUSIBLE_AGE as i64).contains(&age) => {
                DetectionVerdict::uncertain(REASON_REMOTE_INVALID_AGE)
            }
            _ if response.confidence == Confidence::Low => {
                DetectionVerdict::uncertain(REASON_REMOTE_LOW_CONFIDENCE)
            }
            age => DetectionVerdict::adult(age.and_then(|a| u8::try_from(a).ok()), REASON_REMOTE_ADULT)
                .with_confidence(response.confidence),
        },
        (false, false) => DetectionVerdict {
            reason_code: REASON_REMOTE_NO_AGE.to_string(),
            ..DetectionVerdict::no_age_stated()
        },
    };

    Ok(verdict)
}

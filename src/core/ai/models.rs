use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.1,
            max_tokens: Some(150),
            json_mode: true,
        }
    }
}

/// Failure of one remote call, categorized by the transport.
///
/// Retry and cooldown logic branch on the variant, never on message text.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("credential rejected: {0}")]
    Auth(String),

    #[error("rate limited (quota exhausted: {quota_exhausted}): {message}")]
    RateLimited {
        quota_exhausted: bool,
        message: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl ProviderError {
    /// Short label used in logs and metrics-like counters.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Auth(_) => "auth",
            ProviderError::RateLimited { .. } => "rate_limited",
            ProviderError::Network(_) => "network",
            ProviderError::Timeout => "timeout",
            ProviderError::Parse(_) => "parse",
            ProviderError::Api { .. } => "api",
        }
    }

    /// Failures caused by the credential itself rather than the network.
    pub fn is_credential_fault(&self) -> bool {
        matches!(
            self,
            ProviderError::Auth(_) | ProviderError::RateLimited { .. }
        )
    }

    pub fn is_quota_exhausted(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited {
                quota_exhausted: true,
                ..
            }
        )
    }
}

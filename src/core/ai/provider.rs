use super::models::{AiConfig, AiMessage, ProviderError};
use async_trait::async_trait;

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request using the given credential.
    ///
    /// Returns the raw text content of the first choice. Parsing it into a
    /// verdict is the caller's job.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
        api_key: &str,
    ) -> Result<String, ProviderError>;
}

// OpenAI-compatible chat completions transport.
//
// Works with Groq (default), OpenRouter and any endpoint speaking the same
// `/chat/completions` dialect. The credential is supplied per call so the
// credential pool can rotate keys without rebuilding the client.

use crate::core::ai::{AiConfig, AiMessage, AiProvider, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
}

impl ChatCompletionsClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

fn build_payload(messages: &[AiMessage], config: &AiConfig) -> Value {
    let mut payload = json!({
        "model": config.model,
        "messages": messages,
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
    });
    if config.json_mode {
        payload["response_format"] = json!({ "type": "json_object" });
    }
    payload
}

/// Map a non-success HTTP status (and its body) to a typed error.
fn error_for_status(status: StatusCode, body: &str) -> ProviderError {
    let error_code = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v["error"]["code"]
            .as_str()
            .or_else(|| v["error"]["type"].as_str())
            .map(str::to_string)
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth(body.to_string()),
        StatusCode::PAYMENT_REQUIRED => ProviderError::RateLimited {
            quota_exhausted: true,
            message: body.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            quota_exhausted: matches!(error_code.as_deref(), Some("insufficient_quota")),
            message: body.to_string(),
        },
        _ => ProviderError::Api {
            status: status.as_u16(),
            message: body.to_string(),
        },
    }
}

fn error_for_transport(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_decode() {
        ProviderError::Parse(err.to_string())
    } else {
        ProviderError::Network(err.to_string())
    }
}

fn extract_content(response_json: &Value) -> Result<String, ProviderError> {
    response_json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Parse("Failed to parse response content".to_string()))
}

#[async_trait]
impl AiProvider for ChatCompletionsClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
        api_key: &str,
    ) -> Result<String, ProviderError> {
        let payload = build_payload(messages, config);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(error_for_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &text));
        }

        let response_json: Value = response.json().await.map_err(error_for_transport)?;

        extract_content(&response_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_requests_json_object() {
        let messages = vec![AiMessage::user("hi")];
        let payload = build_payload(&messages, &AiConfig::default());

        assert_eq!(payload["response_format"]["type"], "json_object");
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["model"], "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_payload_without_json_mode() {
        let config = AiConfig {
            json_mode: false,
            ..AiConfig::default()
        };
        let payload = build_payload(&[], &config);
        assert!(payload.get("response_format").is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, "bad key"),
            ProviderError::Auth(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, r#"{"error":{"code":"rate_limit_exceeded"}}"#),
            ProviderError::RateLimited {
                quota_exhausted: false,
                ..
            }
        ));
        assert!(error_for_status(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"type":"insufficient_quota"}}"#
        )
        .is_quota_exhausted());
        assert!(matches!(
            error_for_status(StatusCode::BAD_GATEWAY, "upstream"),
            ProviderError::Api { status: 502, .. }
        ));
    }

    #[test]
    fn test_extract_content() {
        let ok = json!({ "choices": [{ "message": { "content": "{\"is_minor\": false}" } }] });
        assert_eq!(extract_content(&ok).unwrap(), "{\"is_minor\": false}");

        let empty = json!({ "choices": [] });
        assert!(matches!(extract_content(&empty), Err(ProviderError::Parse(_))));
    }
}

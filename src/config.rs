// Start-up configuration read from the environment (and `.env`).

use crate::core::age_check::{ChannelPolicy, DetectionStrategy};
use crate::core::ai::UsageBudget;
use crate::infra::ai::chat_completions_client::DEFAULT_ENDPOINT;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_USAGE_WARNING: u64 = 8_000;
const DEFAULT_USAGE_LIMIT: u64 = 10_000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

pub struct BotConfig {
    pub discord_token: String,
    pub channels: ChannelPolicy,
    pub mod_log_channel_id: u64,
    pub api_keys: Vec<String>,
    pub ai_model: String,
    pub ai_endpoint: String,
    pub strategy: DetectionStrategy,
    pub budget: UsageBudget,
    pub call_timeout: Duration,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let guild_id = parse_id("GUILD_ID", get("GUILD_ID"))?;
        let mod_log_channel_id = parse_id("MOD_LOG_CHANNEL_ID", get("MOD_LOG_CHANNEL_ID"))?;

        let attachment_channels = get("ATTACHMENT_CHANNEL_IDS")
            .map(|raw| {
                split_list(&raw)
                    .map(|id| {
                        id.parse::<u64>().map_err(|_| ConfigError::Invalid {
                            name: "ATTACHMENT_CHANNEL_IDS",
                            value: id.to_string(),
                        })
                    })
                    .collect::<Result<HashSet<u64>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let mut api_keys: Vec<String> = get("AI_API_KEYS")
            .map(|raw| split_list(&raw).map(str::to_string).collect())
            .unwrap_or_default();
        if api_keys.is_empty() {
            api_keys.extend(get("AI_API_KEY").map(|k| k.trim().to_string()));
        }

        let strategy = match get("DETECTION_STRATEGY") {
            Some(raw) => raw.parse::<DetectionStrategy>().map_err(|_| ConfigError::Invalid {
                name: "DETECTION_STRATEGY",
                value: raw,
            })?,
            None => DetectionStrategy::Hybrid,
        };

        let warning = parse_u64("AI_USAGE_WARNING", get("AI_USAGE_WARNING"), DEFAULT_USAGE_WARNING)?;
        let limit = parse_u64("AI_USAGE_LIMIT", get("AI_USAGE_LIMIT"), DEFAULT_USAGE_LIMIT)?;
        let timeout_secs = parse_u64("AI_TIMEOUT_SECS", get("AI_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            discord_token,
            channels: ChannelPolicy {
                guild_id,
                attachment_channels,
            },
            mod_log_channel_id,
            api_keys,
            ai_model: get("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            ai_endpoint: get("AI_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            strategy,
            // Zero disables a threshold.
            budget: UsageBudget {
                warning: (warning > 0).then_some(warning),
                limit: (limit > 0).then_some(limit),
            },
            call_timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_id(name: &'static str, value: Option<String>) -> Result<u64, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(name))?;
    let parsed = value.trim().parse();
    parsed.map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_u64(name: &'static str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match value {
        Some(value) => {
            let parsed = value.trim().parse();
            parsed.map_err(|_| ConfigError::Invalid { name, value })
        }
        None => Ok(default),
    }
}

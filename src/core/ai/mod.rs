pub mod credential_pool;
pub mod models;
pub mod prompt;
pub mod provider;
pub mod remote_classifier;
pub mod usage_tracker;

pub use credential_pool::{CredentialPool, PoolHealth, PoolPolicy};
pub use models::{AiConfig, AiMessage, ProviderError};
pub use provider::AiProvider;
pub use remote_classifier::RemoteClassifier;
pub use usage_tracker::{UsageBudget, UsageEvent, UsageSnapshot, UsageTracker};

//! Configuration for the LLM provider client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmApiConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chat-completions endpoint relative to `base_url`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl LlmApiConfig {
    /// Full chat-completions URL
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds.max(0.0))
    }
}

impl Default for LlmApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env_var: default_api_key_env_var(),
            timeout_seconds: default_timeout_seconds(),
            temperature: 0.0,
            retry: RetryConfig::default(),
        }
    }
}

/// When and how often failed requests are repeated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Extra attempts after the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds of delay per attempt number (linear backoff)
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_true")]
    pub retry_on_5xx: bool,

    #[serde(default = "default_true")]
    pub retry_on_429: bool,

    #[serde(default = "default_true")]
    pub retry_on_timeout: bool,
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64((self.backoff_factor * f64::from(attempt)).max(0.0))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            retry_on_5xx: true,
            retry_on_429: true,
            retry_on_timeout: true,
        }
    }
}

fn default_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_endpoint() -> String {
    "/chat/completions".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_api_key_env_var() -> String {
    "LLM_API_KEY".to_string()
}

fn default_timeout_seconds() -> f64 {
    30.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

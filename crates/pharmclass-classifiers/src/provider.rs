//! HTTP client for OpenAI-compatible chat-completions providers

use std::sync::Arc;

use async_trait::async_trait;
use pharmclass_core::{extract_json_payload, ProductRecord, RawResponse};
use pharmclass_policy::CategoryIndex;
use serde_json::json;
use tracing::{debug, warn};

use crate::client::{ModelClient, ModelError};
use crate::config::LlmApiConfig;
use crate::prompt::PromptBuilder;

/// Longest provider error body kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 512;

/// What made a failed request eligible for a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryTrigger {
    ServerError,
    RateLimit,
    Network,
}

/// [`ModelClient`] backed by a provider's chat-completions API
pub struct ProviderClient {
    config: LlmApiConfig,
    api_key: String,
    http: reqwest::Client,
    categories: Arc<CategoryIndex>,
    prompts: PromptBuilder,
}

impl ProviderClient {
    /// Create a client, reading the API key from the configured environment variable
    pub fn new(config: LlmApiConfig, categories: Arc<CategoryIndex>) -> Result<Self, ModelError> {
        let api_key = std::env::var(&config.api_key_env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ModelError::Config(format!(
                    "missing API key in env var {}",
                    config.api_key_env_var
                ))
            })?;

        Self::with_api_key(config, api_key, categories)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(
        config: LlmApiConfig,
        api_key: impl Into<String>,
        categories: Arc<CategoryIndex>,
    ) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key: api_key.into(),
            http,
            categories,
            prompts: PromptBuilder::new(),
        })
    }

    /// Chat-completions request body for `record`
    pub fn request_body(&self, record: &ProductRecord) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [
                {"role": "system", "content": self.prompts.system_prompt()},
                {"role": "user", "content": self.prompts.user_prompt(record, self.categories.iter())},
            ],
        })
    }

    /// POST `body`, retrying transient failures as configured
    async fn post_with_retries(&self, body: &serde_json::Value) -> Result<String, ModelError> {
        let url = self.config.url();
        let retry = &self.config.retry;
        let mut attempt = 0;

        loop {
            let (error, trigger) = match self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    return response
                        .text()
                        .await
                        .map_err(|e| self.transport_error(e).0);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let text = response.text().await.unwrap_or_default();
                    status_error(status, &text)
                }
                Err(e) => self.transport_error(e),
            };

            let allowed = match trigger {
                Some(RetryTrigger::ServerError) => retry.retry_on_5xx,
                Some(RetryTrigger::RateLimit) => retry.retry_on_429,
                Some(RetryTrigger::Network) => retry.retry_on_timeout,
                None => false,
            };
            if !allowed || attempt >= retry.max_retries {
                return Err(error);
            }

            attempt += 1;
            let delay = retry.backoff(attempt);
            warn!(
                url = %url,
                attempt,
                max_retries = retry.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying model request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> (ModelError, Option<RetryTrigger>) {
        if err.is_timeout() {
            (
                ModelError::Timeout(self.config.timeout()),
                Some(RetryTrigger::Network),
            )
        } else if err.is_builder() {
            (ModelError::Config(err.to_string()), None)
        } else if err.is_decode() {
            (ModelError::MalformedResponse(err.to_string()), None)
        } else {
            (
                ModelError::Transient(err.to_string()),
                Some(RetryTrigger::Network),
            )
        }
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    async fn classify_sku(&self, record: &ProductRecord) -> Result<RawResponse, ModelError> {
        let body = self.request_body(record);
        let text = self.post_with_retries(&body).await?;
        let raw = extract_json_payload(&text)?;

        debug!(
            sku = %record.name,
            fields = raw.len(),
            "Received model response"
        );

        Ok(raw)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Map a non-success HTTP status to an error and its retry trigger
fn status_error(status: u16, body: &str) -> (ModelError, Option<RetryTrigger>) {
    let body = truncate(body.trim(), MAX_ERROR_BODY_CHARS);
    match status {
        429 => (ModelError::RateLimited, Some(RetryTrigger::RateLimit)),
        500..=599 => (
            ModelError::Transient(format!("HTTP {}: {}", status, body)),
            Some(RetryTrigger::ServerError),
        ),
        401 | 403 => (ModelError::Auth(format!("HTTP {}: {}", status, body)), None),
        _ => (ModelError::Http { status, body }, None),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

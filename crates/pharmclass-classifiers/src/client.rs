//! Model boundary: the capability to classify a SKU with a language model

use std::time::Duration;

use async_trait::async_trait;
use pharmclass_core::{ProductRecord, RawResponse};

/// Anything that can ask a model to classify a product record
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Return the model's raw structured answer for `record`
    async fn classify_sku(&self, record: &ProductRecord) -> Result<RawResponse, ModelError>;

    /// Get the client name
    fn name(&self) -> &str;
}

/// Failure at the model boundary
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Request did not complete in time
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Provider rejected the request with HTTP 429
    #[error("rate limited by provider")]
    RateLimited,

    /// Transient failure (5xx, connection reset, DNS)
    #[error("transient failure: {0}")]
    Transient(String),

    /// Credentials rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Non-retryable HTTP status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response could not be interpreted
    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    /// Client is misconfigured
    #[error("client configuration error: {0}")]
    Config(String),
}

/// Retry classification of a [`ModelError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Safe to repeat the request
    Retryable,
    /// Repeating will not help
    Terminal,
}

impl ModelError {
    /// Whether the failure is transient
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) | Self::RateLimited | Self::Transient(_) => ErrorKind::Retryable,
            Self::Auth(_) | Self::Http { .. } | Self::MalformedResponse(_) | Self::Config(_) => {
                ErrorKind::Terminal
            }
        }
    }

    /// Shorthand for `kind() == ErrorKind::Retryable`
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Retryable
    }
}

impl From<pharmclass_core::Error> for ModelError {
    fn from(err: pharmclass_core::Error) -> Self {
        match err {
            pharmclass_core::Error::Config(msg) => Self::Config(msg),
            other => Self::MalformedResponse(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(ModelError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(ModelError::RateLimited.is_retryable());
        assert!(ModelError::Transient("502".into()).is_retryable());

        assert!(!ModelError::Auth("bad key".into()).is_retryable());
        assert!(!ModelError::MalformedResponse("not json".into()).is_retryable());
        assert_eq!(
            ModelError::Http {
                status: 400,
                body: "bad request".into()
            }
            .kind(),
            ErrorKind::Terminal
        );
    }

    #[test]
    fn test_core_errors_map_to_terminal() {
        let err: ModelError = pharmclass_core::Error::response("empty content").into();
        assert!(matches!(err, ModelError::MalformedResponse(_)));

        let err: ModelError = pharmclass_core::Error::config("missing key").into();
        assert!(matches!(err, ModelError::Config(_)));
    }
}

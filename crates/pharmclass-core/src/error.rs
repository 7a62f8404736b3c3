//! Error types for the classifier

/// Result type alias using the classifier's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for classifier operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors (invalid thresholds, missing settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Taxonomy errors (duplicate or blank category codes)
    #[error("taxonomy error: {0}")]
    Taxonomy(String),

    /// Product record errors
    #[error("invalid product record: {0}")]
    InvalidRecord(String),

    /// Model response payload errors
    #[error("response error: {0}")]
    Response(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new taxonomy error
    pub fn taxonomy(msg: impl Into<String>) -> Self {
        Self::Taxonomy(msg.into())
    }

    /// Create a new product record error
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Create a new response payload error
    pub fn response(msg: impl Into<String>) -> Self {
        Self::Response(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

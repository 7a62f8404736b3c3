//! Pharmclass Core
//!
//! Core types and utilities shared across the pharmacy SKU classifier.
//!
//! This crate provides:
//! - The data model: product records, taxonomy rows and classification results
//! - Error types and result handling
//! - Extraction of the structured payload from chat-completion responses

pub mod completion;
pub mod error;
pub mod types;

pub use completion::extract_json_payload;
pub use error::{Error, Result};
pub use types::{CategoryNode, ClassificationResult, ProductRecord, RawResponse};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{CategoryNode, ClassificationResult, ProductRecord, RawResponse};
}

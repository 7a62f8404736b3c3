//! Pharmclass Classifiers
//!
//! LLM-backed classification of pharmacy SKUs into a fixed category taxonomy.
//!
//! A classification runs in three steps:
//! - a [`ModelClient`] asks the language model for a structured answer
//! - the normalizer coerces that answer into a bounded [`ClassificationResult`]
//! - the policy [`DecisionEngine`] applies review thresholds and safety rules
//!
//! [`ClassificationResult`]: pharmclass_core::ClassificationResult
//! [`DecisionEngine`]: pharmclass_policy::DecisionEngine

pub mod batch;
pub mod client;
pub mod config;
pub mod evaluate;
pub mod normalizer;
pub mod prompt;
pub mod provider;
pub mod service;
pub mod sink;

pub use batch::{run_batch, BatchSummary};
pub use client::{ErrorKind, ModelClient, ModelError};
pub use config::{LlmApiConfig, RetryConfig};
pub use evaluate::{evaluate, EvaluationReport, LabeledSku, Mismatch};
pub use normalizer::{normalize_confidence, normalize_response};
pub use prompt::PromptBuilder;
pub use provider::ProviderClient;
pub use service::ClassifierService;
pub use sink::{MemorySink, ResultSink};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::{ModelClient, ModelError};
    pub use crate::service::ClassifierService;
    pub use crate::sink::ResultSink;
    pub use pharmclass_core::prelude::*;
    pub use pharmclass_policy::prelude::*;
}

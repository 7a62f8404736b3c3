//! Pharmclass Policy
//!
//! Deterministic review rules applied on top of model classifications.
//!
//! Rules, in application order:
//! - Threshold: confidence below the hard-reject or review threshold requires review
//! - Model hint: a review requested by the model is never cleared
//! - Multi-cluster safety: an ingredient shared by several taxonomy rows
//!   forces review and caps confidence

pub mod config;
pub mod engine;
pub mod index;
pub mod rule;

pub use config::DecisionConfig;
pub use engine::{Decision, DecisionEngine};
pub use index::CategoryIndex;
pub use rule::{ReviewBand, RuleOutcome, MODEL_HINT_CLAUSE};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::DecisionConfig;
    pub use crate::engine::{Decision, DecisionEngine};
    pub use crate::index::CategoryIndex;
    pub use crate::rule::{ReviewBand, RuleOutcome};
}

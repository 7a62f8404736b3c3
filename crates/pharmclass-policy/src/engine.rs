//! Decision engine

use std::sync::Arc;

use pharmclass_core::{ClassificationResult, Result};
use serde::Serialize;
use tracing::debug;

use crate::rule::{apply_multi_cluster_rule, apply_threshold_rule, ReviewBand, RuleOutcome};
use crate::{CategoryIndex, DecisionConfig};

/// Applies review thresholds, the model's hint and the multi-cluster safety
/// override to normalized classification results.
///
/// The engine is immutable after construction and can be shared across
/// concurrent classifications.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: DecisionConfig,
    index: Arc<CategoryIndex>,
}

impl DecisionEngine {
    /// Create an engine; invalid thresholds are rejected
    pub fn new(config: DecisionConfig, index: Arc<CategoryIndex>) -> Result<Self> {
        config.validate()?;

        debug!(
            hard_reject = config.hard_reject_threshold,
            confidence = config.confidence_threshold,
            categories = index.len(),
            "Decision engine ready"
        );

        Ok(Self { config, index })
    }

    /// Create an engine with no taxonomy; the multi-cluster rule never fires
    pub fn without_taxonomy(config: DecisionConfig) -> Result<Self> {
        Self::new(config, Arc::new(CategoryIndex::empty()))
    }

    /// Thresholds in use
    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Category index consulted by the multi-cluster rule
    pub fn index(&self) -> &Arc<CategoryIndex> {
        &self.index
    }

    /// Threshold rule on its own: true when `confidence` is below either threshold
    pub fn should_flag_for_review(&self, confidence: f32) -> bool {
        ReviewBand::for_confidence(confidence, &self.config).needs_review()
    }

    /// Apply the threshold rule and merge in the model's review hint
    pub fn apply_review_thresholds(&self, result: &mut ClassificationResult) -> Vec<RuleOutcome> {
        apply_threshold_rule(&self.config, result)
    }

    /// Apply the multi-cluster safety override
    pub fn apply_multi_cluster_safety(
        &self,
        result: &mut ClassificationResult,
    ) -> Option<RuleOutcome> {
        apply_multi_cluster_rule(&self.config, &self.index, result)
    }

    /// Run all rules in order on `result`
    pub fn decide(&self, result: &mut ClassificationResult) -> Decision {
        let mut fired = self.apply_review_thresholds(result);
        fired.extend(self.apply_multi_cluster_safety(result));

        Decision {
            needs_review: result.needs_review,
            confidence: result.confidence,
            fired,
        }
    }
}

/// Summary of what the engine did to one result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// Final review flag
    pub needs_review: bool,

    /// Final confidence
    pub confidence: f32,

    /// Rules that fired, in application order
    pub fired: Vec<RuleOutcome>,
}

impl Decision {
    /// Whether the multi-cluster override fired
    pub fn multi_cluster(&self) -> bool {
        self.fired
            .iter()
            .any(|outcome| matches!(outcome, RuleOutcome::MultiCluster { .. }))
    }

    /// Whether any rule fired
    pub fn any_fired(&self) -> bool {
        !self.fired.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmclass_core::CategoryNode;

    fn engine_with(nodes: Vec<CategoryNode>) -> DecisionEngine {
        let index = CategoryIndex::new(nodes).unwrap();
        DecisionEngine::new(DecisionConfig::default(), Arc::new(index)).unwrap()
    }

    fn ibuprofen_result(confidence: f32) -> ClassificationResult {
        let mut result = ClassificationResult::new("Nurofen 200mg");
        result.confidence = confidence;
        result.active_ingredient = Some("Ibuprofen".to_string());
        result.category_code = Some("A01".to_string());
        result
    }

    #[test]
    fn test_invalid_config_prevents_construction() {
        let config = DecisionConfig::new(0.9, 0.3);
        assert!(DecisionEngine::without_taxonomy(config).is_err());
    }

    #[test]
    fn test_should_flag_for_review() {
        let engine = DecisionEngine::without_taxonomy(DecisionConfig::default()).unwrap();
        assert!(engine.should_flag_for_review(0.1));
        assert!(engine.should_flag_for_review(0.5));
        assert!(!engine.should_flag_for_review(0.75));
        assert!(!engine.should_flag_for_review(0.99));
    }

    #[test]
    fn test_unambiguous_high_confidence_passes() {
        let engine = engine_with(vec![
            CategoryNode::new("A01").with_ingredient_cluster("Ibuprofen"),
        ]);
        let mut result = ibuprofen_result(0.9);

        let decision = engine.decide(&mut result);

        assert!(!decision.any_fired());
        assert!(!result.needs_review);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.category_code.as_deref(), Some("A01"));
    }

    #[test]
    fn test_ambiguous_cluster_caps_confidence() {
        let engine = engine_with(vec![
            CategoryNode::new("A01").with_ingredient_cluster("Ibuprofen"),
            CategoryNode::new("A02").with_ingredient_cluster("Ibuprofen"),
        ]);
        let mut result = ibuprofen_result(0.9);

        let decision = engine.decide(&mut result);

        assert!(decision.multi_cluster());
        assert!(result.needs_review);
        assert_eq!(result.confidence, 0.6);
        assert!(result.reason.contains("matches 2 categories"));
    }

    #[test]
    fn test_without_taxonomy_multi_cluster_is_noop() {
        let engine = DecisionEngine::without_taxonomy(DecisionConfig::default()).unwrap();
        let mut result = ibuprofen_result(0.9);

        let decision = engine.decide(&mut result);

        assert!(!decision.multi_cluster());
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn test_rules_only_tighten() {
        let engine = engine_with(vec![
            CategoryNode::new("A01").with_ingredient_cluster("Ibuprofen"),
            CategoryNode::new("A02").with_ingredient_cluster("Ibuprofen"),
        ]);
        let mut result = ibuprofen_result(0.3);
        result.needs_review = true;

        let decision = engine.decide(&mut result);

        assert!(decision.needs_review);
        assert_eq!(decision.confidence, 0.3);
        assert_eq!(decision.fired.len(), 3);
    }

    #[test]
    fn test_hint_only_review_is_explained() {
        let engine = DecisionEngine::without_taxonomy(DecisionConfig::default()).unwrap();
        let mut result = ibuprofen_result(0.95);
        result.needs_review = true;

        let decision = engine.decide(&mut result);

        assert_eq!(decision.fired, vec![RuleOutcome::ModelHint]);
        assert!(decision.needs_review);
        assert_eq!(result.reason, crate::MODEL_HINT_CLAUSE);
    }

    #[test]
    fn test_nan_confidence_is_flagged() {
        let engine = DecisionEngine::without_taxonomy(DecisionConfig::default()).unwrap();
        let mut result = ibuprofen_result(f32::NAN);

        assert!(engine.should_flag_for_review(f32::NAN));
        let decision = engine.decide(&mut result);

        assert!(decision.needs_review);
        assert_eq!(decision.confidence, 0.0);
        assert!(result.reason.contains("hard-reject threshold"));
    }
}

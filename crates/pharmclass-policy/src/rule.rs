//! Review rules applied to a single classification result
//!
//! Rules only ever tighten a decision: they may set `needs_review`, lower
//! `confidence` and append to `reason`, never the reverse. Each rule is
//! idempotent when re-applied to its own output.

use pharmclass_core::ClassificationResult;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{CategoryIndex, DecisionConfig};

/// Reason recorded when the model asked for review without explaining why
pub const MODEL_HINT_CLAUSE: &str = "model requested review";

/// Confidence band a result falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewBand {
    /// Below the hard-reject threshold
    HardReject,
    /// Between the hard-reject and confidence thresholds
    Medium,
    /// At or above the confidence threshold
    Accepted,
}

impl ReviewBand {
    /// Band for the given confidence under `config`; non-finite values are hard rejects
    pub fn for_confidence(confidence: f32, config: &DecisionConfig) -> Self {
        if !confidence.is_finite() || confidence < config.hard_reject_threshold {
            Self::HardReject
        } else if confidence < config.confidence_threshold {
            Self::Medium
        } else {
            Self::Accepted
        }
    }

    /// Whether this band requires human review on its own
    pub fn needs_review(&self) -> bool {
        !matches!(self, Self::Accepted)
    }

    fn clause(&self, config: &DecisionConfig) -> Option<String> {
        match self {
            Self::HardReject => Some(format!(
                "confidence below hard-reject threshold {:.2}; review required",
                config.hard_reject_threshold
            )),
            Self::Medium => Some(format!(
                "confidence below review threshold {:.2}; review required",
                config.confidence_threshold
            )),
            Self::Accepted => None,
        }
    }
}

/// A rule that fired while deciding a result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// Confidence fell below a review threshold
    Threshold { band: ReviewBand },

    /// The model itself asked for review
    ModelHint,

    /// The detected ingredient maps to several taxonomy rows
    MultiCluster {
        ingredient: String,
        matches: usize,
        capped_confidence: f32,
    },
}

/// Threshold rule combined with the model's own review hint.
///
/// `needs_review` becomes `hint OR band.needs_review()`; the hint is the value
/// already carried by the result. A non-finite confidence is reset to `0.0`.
pub fn apply_threshold_rule(
    config: &DecisionConfig,
    result: &mut ClassificationResult,
) -> Vec<RuleOutcome> {
    let mut fired = Vec::new();

    if !result.confidence.is_finite() {
        warn!(sku = %result.sku_name, "Non-finite confidence, treating as 0.0");
        result.confidence = 0.0;
    }

    if result.needs_review {
        if result.reason.trim().is_empty() {
            result.append_reason(MODEL_HINT_CLAUSE);
        }
        fired.push(RuleOutcome::ModelHint);
    }

    let band = ReviewBand::for_confidence(result.confidence, config);
    if let Some(clause) = band.clause(config) {
        result.needs_review = true;
        result.append_reason(&clause);
        fired.push(RuleOutcome::Threshold { band });
    }

    debug!(
        sku = %result.sku_name,
        confidence = result.confidence,
        band = ?band,
        needs_review = result.needs_review,
        "Applied threshold rule"
    );

    fired
}

/// Multi-cluster safety override.
///
/// When the detected ingredient matches more than one taxonomy row the model
/// cannot reliably pick between them from the name alone, so the result is
/// forced into review and its confidence capped.
pub fn apply_multi_cluster_rule(
    config: &DecisionConfig,
    index: &CategoryIndex,
    result: &mut ClassificationResult,
) -> Option<RuleOutcome> {
    let ingredient = result.active_ingredient.as_deref()?.trim().to_string();
    let matches = index.find_by_ingredient(&ingredient).len();
    if matches <= 1 {
        return None;
    }

    let cap = config.multi_cluster_confidence_cap;
    result.needs_review = true;
    result.confidence = result.confidence.min(cap);

    let clause = format!(
        "ingredient '{}' matches {} categories in the taxonomy; review required and confidence capped at {:.2}",
        ingredient, matches, cap
    );
    if result.append_reason(&clause) {
        warn!(
            sku = %result.sku_name,
            ingredient = %ingredient,
            matches,
            "Ambiguous ingredient cluster, forcing review"
        );
    }

    Some(RuleOutcome::MultiCluster {
        ingredient,
        matches,
        capped_confidence: result.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmclass_core::CategoryNode;

    fn result_with(confidence: f32, hint: bool) -> ClassificationResult {
        let mut result = ClassificationResult::new("TEST SKU");
        result.confidence = confidence;
        result.needs_review = hint;
        result
    }

    fn ibuprofen_index(rows: usize) -> CategoryIndex {
        let nodes = (1..=rows)
            .map(|i| CategoryNode::new(format!("A{:02}", i)).with_ingredient_cluster("Ibuprofen"))
            .collect();
        CategoryIndex::new(nodes).unwrap()
    }

    #[test]
    fn test_bands() {
        let config = DecisionConfig::default();
        assert_eq!(ReviewBand::for_confidence(0.0, &config), ReviewBand::HardReject);
        assert_eq!(ReviewBand::for_confidence(0.39, &config), ReviewBand::HardReject);
        assert_eq!(ReviewBand::for_confidence(0.4, &config), ReviewBand::Medium);
        assert_eq!(ReviewBand::for_confidence(0.74, &config), ReviewBand::Medium);
        assert_eq!(ReviewBand::for_confidence(0.75, &config), ReviewBand::Accepted);
        assert_eq!(ReviewBand::for_confidence(1.0, &config), ReviewBand::Accepted);
    }

    #[test]
    fn test_low_confidence_flags_and_explains() {
        let config = DecisionConfig::default();
        let mut result = result_with(0.3, false);

        let fired = apply_threshold_rule(&config, &mut result);

        assert!(result.needs_review);
        assert_eq!(fired, vec![RuleOutcome::Threshold { band: ReviewBand::HardReject }]);
        assert!(result.reason.contains("hard-reject threshold 0.40"));
    }

    #[test]
    fn test_threshold_rule_keeps_existing_reason() {
        let config = DecisionConfig::default();
        let mut result = result_with(0.5, false);
        result.reason = "ambiguous packaging".to_string();

        apply_threshold_rule(&config, &mut result);

        assert!(result.reason.starts_with("ambiguous packaging; "));
        assert!(result.reason.contains("review threshold 0.75"));
    }

    #[test]
    fn test_model_hint_survives_high_confidence() {
        let config = DecisionConfig::default();
        let mut result = result_with(0.95, true);

        let fired = apply_threshold_rule(&config, &mut result);

        assert!(result.needs_review);
        assert_eq!(fired, vec![RuleOutcome::ModelHint]);
        assert_eq!(result.reason, MODEL_HINT_CLAUSE);
    }

    #[test]
    fn test_model_hint_keeps_model_reason() {
        let config = DecisionConfig::default();
        let mut result = result_with(0.95, true);
        result.reason = "two strengths share this name".to_string();

        apply_threshold_rule(&config, &mut result);
        apply_threshold_rule(&config, &mut result);

        assert_eq!(result.reason, "two strengths share this name");
    }

    #[test]
    fn test_model_hint_clause_is_not_duplicated() {
        let config = DecisionConfig::default();
        let mut result = result_with(0.5, true);

        apply_threshold_rule(&config, &mut result);
        let once = result.clone();
        apply_threshold_rule(&config, &mut result);

        assert_eq!(result, once);
        assert!(result.reason.starts_with(MODEL_HINT_CLAUSE));
        assert!(result.reason.contains("review threshold 0.75"));
    }

    #[test]
    fn test_non_finite_confidence_is_hard_rejected() {
        let config = DecisionConfig::default();
        assert_eq!(ReviewBand::for_confidence(f32::NAN, &config), ReviewBand::HardReject);
        assert_eq!(ReviewBand::for_confidence(f32::INFINITY, &config), ReviewBand::HardReject);

        let mut result = result_with(f32::NAN, false);
        let fired = apply_threshold_rule(&config, &mut result);

        assert!(result.needs_review);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(fired, vec![RuleOutcome::Threshold { band: ReviewBand::HardReject }]);
    }

    #[test]
    fn test_threshold_rule_is_idempotent() {
        let config = DecisionConfig::default();
        let mut result = result_with(0.2, false);

        apply_threshold_rule(&config, &mut result);
        let once = result.clone();
        apply_threshold_rule(&config, &mut result);

        assert_eq!(result, once);
    }

    #[test]
    fn test_single_match_is_noop() {
        let config = DecisionConfig::default();
        let index = ibuprofen_index(1);
        let mut result = result_with(0.9, false);
        result.active_ingredient = Some("Ibuprofen".to_string());

        assert!(apply_multi_cluster_rule(&config, &index, &mut result).is_none());
        assert_eq!(result.confidence, 0.9);
        assert!(!result.needs_review);
    }

    #[test]
    fn test_no_ingredient_is_noop() {
        let config = DecisionConfig::default();
        let index = ibuprofen_index(3);
        let mut result = result_with(0.9, false);

        assert!(apply_multi_cluster_rule(&config, &index, &mut result).is_none());
        assert!(!result.needs_review);
    }

    #[test]
    fn test_multi_cluster_caps_and_flags() {
        let config = DecisionConfig::default();
        let index = ibuprofen_index(3);
        let mut result = result_with(0.9, false);
        result.active_ingredient = Some("Ibuprofen".to_string());

        let outcome = apply_multi_cluster_rule(&config, &index, &mut result);

        assert!(matches!(
            outcome,
            Some(RuleOutcome::MultiCluster { matches: 3, .. })
        ));
        assert!(result.confidence <= 0.6);
        assert!(result.needs_review);
        assert!(result.reason.contains("'Ibuprofen' matches 3 categories"));
    }

    #[test]
    fn test_multi_cluster_never_raises_confidence() {
        let config = DecisionConfig::default();
        let index = ibuprofen_index(2);
        let mut result = result_with(0.2, true);
        result.active_ingredient = Some("ibuprofen".to_string());

        apply_multi_cluster_rule(&config, &index, &mut result);

        assert_eq!(result.confidence, 0.2);
    }

    #[test]
    fn test_multi_cluster_is_idempotent() {
        let config = DecisionConfig::default();
        let index = ibuprofen_index(2);
        let mut result = result_with(0.9, false);
        result.active_ingredient = Some("Ibuprofen".to_string());

        apply_multi_cluster_rule(&config, &index, &mut result);
        let once_len = result.reason.len();
        apply_multi_cluster_rule(&config, &index, &mut result);

        assert_eq!(result.reason.len(), once_len);
        assert_eq!(result.confidence, 0.6);
    }
}

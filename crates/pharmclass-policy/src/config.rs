//! Decision thresholds

use pharmclass_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Thresholds consulted by the decision engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Below this confidence the answer is presumed unreliable
    #[serde(default = "default_hard_reject_threshold")]
    pub hard_reject_threshold: f32,

    /// Below this confidence a human check is still required
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Upper bound on confidence when an ingredient maps to several categories
    #[serde(default = "default_multi_cluster_confidence_cap")]
    pub multi_cluster_confidence_cap: f32,
}

impl DecisionConfig {
    /// Create a config with custom review thresholds
    pub fn new(hard_reject_threshold: f32, confidence_threshold: f32) -> Self {
        Self {
            hard_reject_threshold,
            confidence_threshold,
            ..Self::default()
        }
    }

    /// Load from a YAML string and validate
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid decision config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check `0 <= hard_reject <= confidence <= 1` and the cap range
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("hard_reject_threshold", self.hard_reject_threshold),
            ("confidence_threshold", self.confidence_threshold),
            ("multi_cluster_confidence_cap", self.multi_cluster_confidence_cap),
        ];
        for (name, value) in checks {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.hard_reject_threshold > self.confidence_threshold {
            return Err(Error::config(format!(
                "hard_reject_threshold ({}) must not exceed confidence_threshold ({})",
                self.hard_reject_threshold, self.confidence_threshold
            )));
        }

        Ok(())
    }
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            hard_reject_threshold: default_hard_reject_threshold(),
            confidence_threshold: default_confidence_threshold(),
            multi_cluster_confidence_cap: default_multi_cluster_confidence_cap(),
        }
    }
}

fn default_hard_reject_threshold() -> f32 {
    0.4
}

fn default_confidence_threshold() -> f32 {
    0.75
}

fn default_multi_cluster_confidence_cap() -> f32 {
    0.6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DecisionConfig::default();
        assert_eq!(config.hard_reject_threshold, 0.4);
        assert_eq!(config.confidence_threshold, 0.75);
        assert_eq!(config.multi_cluster_confidence_cap, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = DecisionConfig::from_yaml("confidence_threshold: 0.8\n").unwrap();
        assert_eq!(config.confidence_threshold, 0.8);
        assert_eq!(config.hard_reject_threshold, 0.4);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config = DecisionConfig::new(0.8, 0.5);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(DecisionConfig::new(-0.1, 0.5).validate().is_err());
        assert!(DecisionConfig::new(0.4, 1.5).validate().is_err());
        assert!(DecisionConfig::new(f32::NAN, 0.5).validate().is_err());

        let config = DecisionConfig {
            multi_cluster_confidence_cap: 2.0,
            ..DecisionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_equal_thresholds_allowed() {
        assert!(DecisionConfig::new(0.5, 0.5).validate().is_ok());
        assert!(DecisionConfig::new(0.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_yaml_with_bad_ordering_fails() {
        let yaml = "hard_reject_threshold: 0.9\nconfidence_threshold: 0.1\n";
        assert!(DecisionConfig::from_yaml(yaml).is_err());
    }
}

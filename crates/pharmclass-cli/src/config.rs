//! Application configuration

use anyhow::Context;
use pharmclass_classifiers::LlmApiConfig;
use pharmclass_policy::DecisionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model provider settings
    #[serde(default)]
    pub llm: LlmApiConfig,

    /// Review thresholds
    #[serde(default)]
    pub decision: DecisionConfig,

    /// Batch settings
    #[serde(default)]
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &crate::Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("failed to read config file {}", config_path))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("failed to parse config file {}", config_path))?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(base_url) = &cli.base_url {
            config.llm.base_url = base_url.clone();
        }

        if let Some(model) = &cli.model {
            config.llm.model = model.clone();
        }

        if let Some(threshold) = cli.confidence_threshold {
            config.decision.confidence_threshold = threshold;
        }

        if let Some(threshold) = cli.hard_reject_threshold {
            config.decision.hard_reject_threshold = threshold;
        }

        config.decision.validate()?;

        Ok(config)
    }
}

/// Batch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Model calls in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Maximum number of records per run
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            limit: None,
        }
    }
}

fn default_concurrency() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(args: &[&str]) -> crate::Cli {
        let mut argv = vec!["pharmclass"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["lookup", "--taxonomy", "t.yaml", "--ingredient", "x"]);
        crate::Cli::parse_from(argv)
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load("/nonexistent/pharmclass.yaml", &cli(&[])).unwrap();
        assert_eq!(config.decision, DecisionConfig::default());
        assert_eq!(config.batch.concurrency, 4);
        assert_eq!(config.llm.api_key_env_var, "LLM_API_KEY");
    }

    #[test]
    fn test_file_and_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "llm:\n  model: gpt-4o-mini\ndecision:\n  confidence_threshold: 0.8\nbatch:\n  concurrency: 2\n  limit: 20"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = AppConfig::load(&path, &cli(&["--hard-reject-threshold", "0.3"])).unwrap();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.decision.confidence_threshold, 0.8);
        assert_eq!(config.decision.hard_reject_threshold, 0.3);
        assert_eq!(config.batch.concurrency, 2);
        assert_eq!(config.batch.limit, Some(20));
    }

    #[test]
    fn test_invalid_threshold_ordering_is_fatal() {
        let result = AppConfig::load(
            "/nonexistent/pharmclass.yaml",
            &cli(&["--hard-reject-threshold", "0.9", "--confidence-threshold", "0.5"]),
        );
        assert!(result.is_err());
    }
}

//! Configuration for the pericope extraction pipeline
//!
//! Defines per-subsystem configuration with sensible defaults, loadable from
//! an optional TOML file with `PERICOPE_*` environment variable overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PericopeError, Result};

/// When the training controller refits the learned model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetrainPolicy {
    /// Refit at every nonzero multiple of the retrain threshold
    #[default]
    EveryMultiple,

    /// Refit once at the first threshold crossing, then stay fixed
    Once,
}

/// Segmenter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Minimum content length (title plus body) in bytes; shorter sections
    /// merge into a neighbor
    pub min_section_length: usize,

    /// Number of consecutive blank lines that forms a section break
    pub blank_run_threshold: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_section_length: 20,
            blank_run_threshold: 3,
        }
    }
}

/// Feature extractor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum bytes of section text handed to the entity analyzer
    pub analyzer_text_cap: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            analyzer_text_cap: 1_000_000,
        }
    }
}

/// Relevance scorer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Word count below which a section is treated as boilerplate-length
    pub min_content_words: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            min_content_words: 20,
        }
    }
}

/// Training controller and ensemble settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Feedback count interval that triggers a refit
    pub retrain_threshold: usize,

    /// Whether refits repeat at every interval or happen once
    pub policy: RetrainPolicy,

    /// Number of trees in the ensemble
    pub tree_count: usize,

    /// Maximum depth of each tree
    pub max_depth: usize,

    /// Seed for bootstrap and feature subsampling; fixed for reproducibility
    pub seed: u64,

    /// Minimum sample count for a holdout accuracy estimate
    pub holdout_min_samples: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            retrain_threshold: 10,
            policy: RetrainPolicy::EveryMultiple,
            tree_count: 100,
            max_depth: 10,
            seed: 42,
            holdout_min_samples: 20,
        }
    }
}

/// Aggregate configuration for the whole pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PericopeConfig {
    /// Segmenter settings
    pub segmenter: SegmenterConfig,

    /// Feature extractor settings
    pub extractor: ExtractorConfig,

    /// Relevance scorer settings
    pub scorer: ScorerConfig,

    /// Training controller settings
    pub training: TrainingConfig,
}

impl PericopeConfig {
    /// Load configuration from an optional TOML file plus environment
    ///
    /// Environment variables use the `PERICOPE_` prefix with `__` separating
    /// nesting levels, e.g. `PERICOPE_TRAINING__RETRAIN_THRESHOLD=25`.
    /// Missing file or missing keys fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("PERICOPE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: PericopeConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.training.retrain_threshold == 0 {
            return Err(validation_error("training.retrain_threshold must be >= 1"));
        }
        if self.training.tree_count == 0 {
            return Err(validation_error("training.tree_count must be >= 1"));
        }
        if self.training.max_depth == 0 {
            return Err(validation_error("training.max_depth must be >= 1"));
        }
        if self.segmenter.min_section_length == 0 {
            return Err(validation_error("segmenter.min_section_length must be >= 1"));
        }
        if self.segmenter.blank_run_threshold < 2 {
            return Err(validation_error("segmenter.blank_run_threshold must be >= 2"));
        }
        Ok(())
    }
}

fn validation_error(msg: &str) -> PericopeError {
    PericopeError::Config(config::ConfigError::Message(msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = PericopeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.training.retrain_threshold, 10);
        assert_eq!(config.segmenter.min_section_length, 20);
        assert_eq!(config.training.policy, RetrainPolicy::EveryMultiple);
    }

    #[test]
    fn test_validate_zero_threshold() {
        let mut config = PericopeConfig::default();
        config.training.retrain_threshold = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("retrain_threshold must be >= 1"));
    }

    #[test]
    fn test_validate_blank_run_threshold() {
        let mut config = PericopeConfig::default();
        config.segmenter.blank_run_threshold = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_without_file_uses_defaults() {
        std::env::remove_var("PERICOPE_TRAINING__RETRAIN_THRESHOLD");
        let config = PericopeConfig::load(None).unwrap();
        assert_eq!(config.training.retrain_threshold, 10);
        assert_eq!(config.training.seed, 42);
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [segmenter]
            min_section_length = 40

            [training]
            retrain_threshold = 5
            policy = "once"
            "#
        )
        .unwrap();

        std::env::remove_var("PERICOPE_TRAINING__RETRAIN_THRESHOLD");
        let config = PericopeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.segmenter.min_section_length, 40);
        assert_eq!(config.training.retrain_threshold, 5);
        assert_eq!(config.training.policy, RetrainPolicy::Once);
        // Untouched sections keep their defaults
        assert_eq!(config.training.tree_count, 100);
        assert_eq!(config.scorer.min_content_words, 20);
    }

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var("PERICOPE_TRAINING__RETRAIN_THRESHOLD", "25");
        let config = PericopeConfig::load(None).unwrap();
        assert_eq!(config.training.retrain_threshold, 25);
        std::env::remove_var("PERICOPE_TRAINING__RETRAIN_THRESHOLD");
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = PericopeConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: PericopeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            config.training.retrain_threshold,
            deserialized.training.retrain_threshold
        );
        assert_eq!(config.training.policy, deserialized.training.policy);
    }
}

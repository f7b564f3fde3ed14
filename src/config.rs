//! Configuration management for the scoring pipeline

use crate::types::assessment::RiskTierThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    pub scoring: ScoringConfig,
    pub logging: LoggingConfig,
}

/// Paths to the trained artifacts the pipeline consumes.
///
/// All three are opaque outputs of the training process: the form schema
/// (field choices, numeric ranges, defaults, outlier bounds), the
/// preprocessing bundle (encoders, scaler parameters, feature selection),
/// and the ONNX model.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Path to the form schema JSON
    pub form_schema: String,
    /// Path to the preprocessing bundle JSON
    pub bundle: String,
    /// Path to the ONNX model file
    pub model: String,
    /// Model name used in assessments and logs
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_model_name() -> String {
    "gradient_boosting".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

/// Scoring configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Risk tier classification thresholds
    #[serde(default)]
    pub risk_tiers: RiskTierThresholds,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                form_schema: "config/form_schema.json".to_string(),
                bundle: "models/preprocess_bundle.json".to_string(),
                model: "models/default_model.onnx".to_string(),
                model_name: default_model_name(),
                onnx_threads: 1,
            },
            scoring: ScoringConfig {
                risk_tiers: RiskTierThresholds::default(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.artifacts.model_name, "gradient_boosting");
        assert_eq!(config.artifacts.onnx_threads, 1);
        assert_eq!(config.scoring.risk_tiers.moderate, 0.3);
        assert_eq!(config.scoring.risk_tiers.high, 0.6);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        write!(
            file,
            r#"
[artifacts]
form_schema = "config/form_schema.json"
bundle = "models/preprocess_bundle.json"
model = "models/default_model.onnx"

[scoring.risk_tiers]
moderate = 0.25
high = 0.55

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.scoring.risk_tiers.moderate, 0.25);
        assert_eq!(config.scoring.risk_tiers.high, 0.55);
        assert_eq!(config.logging.level, "debug");
        // Fields absent from the file fall back to serde defaults
        assert_eq!(config.artifacts.model_name, "gradient_boosting");
    }
}

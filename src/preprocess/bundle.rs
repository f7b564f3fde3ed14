//! Preprocessing bundle loader.
//!
//! The bundle is a training-time artifact holding everything the pipeline
//! needs to reproduce the fitted preprocessing: per-column label encoder
//! classes, standard scaler parameters, the outlier-handled feature list,
//! and the final feature selection.

use crate::features::SCALER_FEATURES;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// A fitted label encoder: ordered class list from training.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    /// Map a category to its class index, or None if unseen during training.
    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == value)
    }
}

/// Fitted standard scaler parameters, aligned with the scaler column order.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// The deserialized preprocessing bundle
#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessBundle {
    /// Label encoders per categorical column
    pub label_encoders: HashMap<String, LabelEncoder>,
    /// Standard scaler parameters
    pub scaler: ScalerParams,
    /// Features that received outlier clipping during training
    pub outlier_features: Vec<String>,
    /// Final model features, in model input order
    pub features_selected: Vec<String>,
}

impl PreprocessBundle {
    /// Load and validate a bundle from a JSON file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preprocessing bundle from {:?}", path))?;
        let bundle: PreprocessBundle = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse preprocessing bundle from {:?}", path))?;

        bundle.validate()?;

        info!(
            encoders = bundle.label_encoders.len(),
            selected = bundle.features_selected.len(),
            "Preprocessing bundle loaded"
        );

        Ok(bundle)
    }

    /// Check internal consistency against the scaler column order.
    pub fn validate(&self) -> Result<()> {
        let expected = SCALER_FEATURES.len();
        if self.scaler.mean.len() != expected {
            bail!(
                "scaler mean has {} entries, expected {}",
                self.scaler.mean.len(),
                expected
            );
        }
        if self.scaler.scale.len() != expected {
            bail!(
                "scaler scale has {} entries, expected {}",
                self.scaler.scale.len(),
                expected
            );
        }
        if let Some(zero) = self.scaler.scale.iter().position(|&s| s == 0.0) {
            bail!(
                "scaler scale is zero for column {}",
                SCALER_FEATURES[zero]
            );
        }
        for column in self.label_encoders.keys() {
            if !SCALER_FEATURES.contains(&column.as_str()) {
                bail!("label encoder for unknown column {}", column);
            }
        }
        for feature in &self.outlier_features {
            if !SCALER_FEATURES.contains(&feature.as_str()) {
                bail!("outlier feature {} is not a scaler column", feature);
            }
        }
        for feature in &self.features_selected {
            if feature != "fico_score_avg" && !SCALER_FEATURES.contains(&feature.as_str()) {
                bail!("selected feature {} is not a scaler column", feature);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_bundle_json() -> String {
        let mean: Vec<f64> = (0..26).map(|i| i as f64).collect();
        let scale: Vec<f64> = vec![1.0; 26];
        format!(
            r#"{{
                "label_encoders": {{
                    "home_ownership": {{ "classes": ["MORTGAGE", "OWN", "RENT"] }}
                }},
                "scaler": {{ "mean": {:?}, "scale": {:?} }},
                "outlier_features": ["annual_inc"],
                "features_selected": ["int_rate", "loan_amnt", "fico_score_avg"]
            }}"#,
            mean, scale
        )
    }

    #[test]
    fn test_load_valid_bundle() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", minimal_bundle_json()).unwrap();

        let bundle = PreprocessBundle::load_from_path(file.path()).unwrap();
        assert_eq!(bundle.features_selected.len(), 3);
        assert_eq!(bundle.outlier_features, vec!["annual_inc"]);
    }

    #[test]
    fn test_encoder_transform() {
        let encoder = LabelEncoder {
            classes: vec!["MORTGAGE".to_string(), "OWN".to_string(), "RENT".to_string()],
        };

        assert_eq!(encoder.transform("MORTGAGE"), Some(0));
        assert_eq!(encoder.transform("RENT"), Some(2));
        assert_eq!(encoder.transform("HOUSEBOAT"), None);
    }

    #[test]
    fn test_scaler_length_mismatch_rejected() {
        let mut bundle: PreprocessBundle =
            serde_json::from_str(&minimal_bundle_json()).unwrap();
        bundle.scaler.mean.pop();

        let err = bundle.validate().unwrap_err();
        assert!(err.to_string().contains("25 entries"));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut bundle: PreprocessBundle =
            serde_json::from_str(&minimal_bundle_json()).unwrap();
        bundle.scaler.scale[3] = 0.0;

        let err = bundle.validate().unwrap_err();
        assert!(err.to_string().contains("fico_range_low"));
    }

    #[test]
    fn test_unknown_selected_feature_rejected() {
        let mut bundle: PreprocessBundle =
            serde_json::from_str(&minimal_bundle_json()).unwrap();
        bundle.features_selected.push("shoe_size".to_string());

        assert!(bundle.validate().is_err());
    }
}

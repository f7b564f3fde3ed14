//! Fitted preprocessing chain: outlier clipping, label encoding, standard
//! scaling, and feature selection.

pub mod bundle;

pub use bundle::{LabelEncoder, PreprocessBundle, ScalerParams};

use crate::features::{feature_index, FeatureRow, FeatureValue};
use crate::form::OutlierBounds;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use tracing::debug;

/// Hard upper bound on the debt-to-income ratio, applied regardless of the
/// outlier table.
const DTI_CAP: f64 = 60.0;

/// Applies the fitted preprocessing to assembled feature rows.
pub struct Preprocessor {
    bundle: PreprocessBundle,
    outlier_bounds: HashMap<String, OutlierBounds>,
}

impl Preprocessor {
    /// Create a preprocessor from a validated bundle and the schema's
    /// outlier bounds table.
    pub fn new(
        bundle: PreprocessBundle,
        outlier_bounds: HashMap<String, OutlierBounds>,
    ) -> Result<Self> {
        bundle.validate()?;
        Ok(Self {
            bundle,
            outlier_bounds,
        })
    }

    pub fn bundle(&self) -> &PreprocessBundle {
        &self.bundle
    }

    /// Number of features the model receives after selection
    pub fn selected_count(&self) -> usize {
        self.bundle.features_selected.len()
    }

    /// Run the full chain on one row: clip, encode, scale, select.
    /// Returns the model input vector in selection order.
    pub fn apply(&self, mut row: FeatureRow) -> Result<Vec<f32>> {
        self.clip_outliers(&mut row);
        self.encode(&mut row)?;
        let scaled = self.scale(row)?;
        self.select(&scaled)
    }

    /// Clamp numeric features into their trained bounds.
    ///
    /// A feature is clipped only when it appears in both the schema's bounds
    /// table and the bundle's outlier feature list; the whole step is skipped
    /// when the bundle carries no feature selection. The DTI cap always
    /// applies.
    fn clip_outliers(&self, row: &mut FeatureRow) {
        if !self.bundle.features_selected.is_empty() {
            for (feature, bounds) in &self.outlier_bounds {
                if !self.bundle.outlier_features.iter().any(|f| f == feature) {
                    continue;
                }
                match row.get_mut(feature) {
                    Some(FeatureValue::Number(value)) => {
                        let clipped = value.clamp(bounds.lower, bounds.upper);
                        if clipped != *value {
                            debug!(
                                feature = %feature,
                                raw = *value,
                                clipped = clipped,
                                "Clipped outlier"
                            );
                        }
                        *value = clipped;
                    }
                    // Bounds on a still-categorical slot have no meaning
                    Some(FeatureValue::Category(_)) | None => {}
                }
            }
        }

        if let Some(FeatureValue::Number(dti)) = row.get_mut("dti") {
            *dti = dti.min(DTI_CAP);
        }
    }

    /// Replace category slots with their trained class indices.
    fn encode(&self, row: &mut FeatureRow) -> Result<()> {
        for (column, encoder) in &self.bundle.label_encoders {
            let Some(slot) = row.get_mut(column) else {
                continue;
            };
            if let FeatureValue::Category(value) = slot {
                let index = encoder.transform(value).with_context(|| {
                    format!(
                        "{} has category {:?} unseen during training; known classes: {:?}",
                        column, value, encoder.classes
                    )
                })?;
                *slot = FeatureValue::Number(index as f64);
            }
        }
        Ok(())
    }

    /// Standard-scale the fully numeric row: (x - mean) / scale per column.
    fn scale(&self, row: FeatureRow) -> Result<Vec<f64>> {
        let numbers = row.into_numbers()?;
        Ok(numbers
            .iter()
            .zip(self.bundle.scaler.mean.iter())
            .zip(self.bundle.scaler.scale.iter())
            .map(|((x, mean), scale)| (x - mean) / scale)
            .collect())
    }

    /// Project the scaled row down to the model's selected features, deriving
    /// the scaled-space FICO average on the way.
    fn select(&self, scaled: &[f64]) -> Result<Vec<f32>> {
        let fico_low = scaled_value(scaled, "fico_range_low")?;
        let fico_high = scaled_value(scaled, "fico_range_high")?;
        let fico_score_avg = (fico_low + fico_high) / 2.0;

        let mut selected = Vec::with_capacity(self.bundle.features_selected.len());
        for feature in &self.bundle.features_selected {
            let value = if feature == "fico_score_avg" {
                fico_score_avg
            } else {
                match feature_index(feature) {
                    Some(i) => scaled[i],
                    None => bail!("selected feature {} is not a scaler column", feature),
                }
            };
            selected.push(value as f32);
        }

        Ok(selected)
    }
}

fn scaled_value(scaled: &[f64], name: &str) -> Result<f64> {
    feature_index(name)
        .and_then(|i| scaled.get(i).copied())
        .with_context(|| format!("missing scaler column {}", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SCALER_FEATURES;

    fn identity_bundle(selected: Vec<&str>) -> PreprocessBundle {
        let json = format!(
            r#"{{
                "label_encoders": {{
                    "home_ownership": {{ "classes": ["MORTGAGE", "OWN", "RENT"] }},
                    "purpose": {{ "classes": ["credit_card", "debt_consolidation"] }},
                    "sub_grade": {{ "classes": ["A1", "A2"] }},
                    "addr_state": {{ "classes": ["CA", "NY"] }},
                    "application_type": {{ "classes": ["Individual", "Joint App"] }},
                    "verification_status": {{ "classes": ["Not Verified", "Verified"] }},
                    "initial_list_status": {{ "classes": ["f", "w"] }}
                }},
                "scaler": {{ "mean": {:?}, "scale": {:?} }},
                "outlier_features": ["annual_inc", "revol_bal"],
                "features_selected": {:?}
            }}"#,
            vec![0.0; 26],
            vec![1.0; 26],
            selected
        );
        serde_json::from_str(&json).unwrap()
    }

    fn numeric_row() -> FeatureRow {
        // All numeric; categorical columns already hold encoded values
        FeatureRow::new(
            SCALER_FEATURES
                .iter()
                .enumerate()
                .map(|(i, _)| FeatureValue::Number(i as f64))
                .collect(),
        )
    }

    fn row_with(mut row: FeatureRow, name: &str, value: FeatureValue) -> FeatureRow {
        *row.get_mut(name).unwrap() = value;
        row
    }

    #[test]
    fn test_clipping_applies_to_listed_features() {
        let mut bounds = HashMap::new();
        bounds.insert(
            "annual_inc".to_string(),
            OutlierBounds {
                lower: 0.0,
                upper: 100.0,
            },
        );
        let preprocessor =
            Preprocessor::new(identity_bundle(vec!["annual_inc"]), bounds).unwrap();

        let row = row_with(numeric_row(), "annual_inc", FeatureValue::Number(5000.0));
        let out = preprocessor.apply(row).unwrap();

        assert_eq!(out, vec![100.0]);
    }

    #[test]
    fn test_clipping_skips_features_outside_bundle_list() {
        let mut bounds = HashMap::new();
        bounds.insert(
            "int_rate".to_string(),
            OutlierBounds {
                lower: 0.0,
                upper: 1.0,
            },
        );
        let preprocessor =
            Preprocessor::new(identity_bundle(vec!["int_rate"]), bounds).unwrap();

        let row = row_with(numeric_row(), "int_rate", FeatureValue::Number(25.0));
        let out = preprocessor.apply(row).unwrap();

        // int_rate is not in outlier_features, so the bound is ignored
        assert_eq!(out, vec![25.0]);
    }

    #[test]
    fn test_dti_cap_always_applies() {
        let preprocessor =
            Preprocessor::new(identity_bundle(vec!["dti"]), HashMap::new()).unwrap();

        let row = row_with(numeric_row(), "dti", FeatureValue::Number(95.0));
        let out = preprocessor.apply(row).unwrap();

        assert_eq!(out, vec![60.0]);
    }

    #[test]
    fn test_encoding_replaces_categories() {
        let preprocessor =
            Preprocessor::new(identity_bundle(vec!["home_ownership"]), HashMap::new())
                .unwrap();

        let row = row_with(
            numeric_row(),
            "home_ownership",
            FeatureValue::Category("OWN".to_string()),
        );
        let out = preprocessor.apply(row).unwrap();

        assert_eq!(out, vec![1.0]);
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let preprocessor =
            Preprocessor::new(identity_bundle(vec!["home_ownership"]), HashMap::new())
                .unwrap();

        let row = row_with(
            numeric_row(),
            "home_ownership",
            FeatureValue::Category("HOUSEBOAT".to_string()),
        );
        let err = preprocessor.apply(row).unwrap_err();

        assert!(err.to_string().contains("HOUSEBOAT"));
    }

    #[test]
    fn test_scaling_math() {
        let mut bundle = identity_bundle(vec!["loan_amnt"]);
        let i = feature_index("loan_amnt").unwrap();
        bundle.scaler.mean[i] = 10000.0;
        bundle.scaler.scale[i] = 5000.0;
        let preprocessor = Preprocessor::new(bundle, HashMap::new()).unwrap();

        let row = row_with(numeric_row(), "loan_amnt", FeatureValue::Number(20000.0));
        let out = preprocessor.apply(row).unwrap();

        assert!((out[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_fico_score_avg_derived_after_scaling() {
        let preprocessor =
            Preprocessor::new(identity_bundle(vec!["fico_score_avg"]), HashMap::new())
                .unwrap();

        let row = row_with(
            row_with(numeric_row(), "fico_range_low", FeatureValue::Number(660.0)),
            "fico_range_high",
            FeatureValue::Number(700.0),
        );
        let out = preprocessor.apply(row).unwrap();

        // Identity scaler, so the average is in raw units
        assert!((out[0] - 680.0).abs() < 1e-6);
    }

    #[test]
    fn test_selection_preserves_bundle_order() {
        let preprocessor = Preprocessor::new(
            identity_bundle(vec!["dti", "int_rate", "loan_amnt"]),
            HashMap::new(),
        )
        .unwrap();

        let row = numeric_row();
        let dti = feature_index("dti").unwrap() as f32;
        let int_rate = feature_index("int_rate").unwrap() as f32;
        let loan_amnt = feature_index("loan_amnt").unwrap() as f32;

        let out = preprocessor.apply(row).unwrap();
        assert_eq!(out, vec![dti, int_rate, loan_amnt]);
    }
}

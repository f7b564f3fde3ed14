//! Input form schema: field choices, numeric ranges, defaults, outlier bounds.
//!
//! The schema is a training-time artifact. It drives option lists and
//! validation for the collected fields, and supplies the default values
//! substituted for the background features the form does not collect.

use crate::types::application::LoanApplication;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Per-field numeric constraints and default value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericFieldSpec {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    pub default: f64,
}

/// Clip bounds for one feature
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
}

/// Form schema loaded from the training artifact
#[derive(Debug, Clone, Deserialize)]
pub struct FormSchema {
    /// Option lists for mapped fields (currently only `term`)
    pub mappings: HashMap<String, Vec<String>>,
    /// Option lists per categorical field
    pub categorical: HashMap<String, Vec<String>>,
    /// Numeric field specs (min/max/default)
    pub numerical: HashMap<String, NumericFieldSpec>,
    /// Clip bounds per feature, applied during outlier handling
    pub outlier_bounds: HashMap<String, OutlierBounds>,
}

/// Style a raw option value for display: underscores become spaces and each
/// word is title-cased ("debt_consolidation" -> "Debt Consolidation",
/// "RENT" -> "Rent").
pub fn style_label(option: &str) -> String {
    option
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl FormSchema {
    /// Load the schema from a JSON file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read form schema from {:?}", path))?;
        let schema: FormSchema = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse form schema from {:?}", path))?;
        Ok(schema)
    }

    /// Default value for a numeric background field
    pub fn numeric_default(&self, field: &str) -> Option<f64> {
        self.numerical.get(field).map(|spec| spec.default)
    }

    /// First option of a categorical field, used as its background default
    pub fn first_category(&self, field: &str) -> Option<&str> {
        self.categorical
            .get(field)
            .and_then(|options| options.first())
            .map(|s| s.as_str())
    }

    /// Term options from the mappings table
    pub fn term_options(&self) -> &[String] {
        self.mappings
            .get("term")
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    fn check_numeric_range(&self, field: &str, value: f64) -> Result<()> {
        if let Some(spec) = self.numerical.get(field) {
            if let Some(min) = spec.min {
                if value < min {
                    bail!("{} is {} but must be at least {}", field, value, min);
                }
            }
            if let Some(max) = spec.max {
                if value > max {
                    bail!("{} is {} but must be at most {}", field, value, max);
                }
            }
        }
        Ok(())
    }

    fn check_categorical(&self, field: &str, value: &str) -> Result<()> {
        if let Some(options) = self.categorical.get(field) {
            if !options.iter().any(|o| o == value) {
                bail!(
                    "{} has unknown value {:?}; valid options: {:?}",
                    field,
                    value,
                    options
                );
            }
        }
        Ok(())
    }

    /// Validate a submitted application against the form's constraints.
    ///
    /// Mirrors the input widgets: fixed ranges on the collected numeric
    /// fields, schema-driven ranges where specified, and membership checks
    /// on every categorical selection.
    pub fn validate(&self, app: &LoanApplication) -> Result<()> {
        if app.loan_amnt < 1.0 {
            bail!("loan_amnt is {} but must be at least 1", app.loan_amnt);
        }
        if app.int_rate < 0.0 {
            bail!("int_rate is {} but must be non-negative", app.int_rate);
        }
        if app.annual_inc < 0.0 {
            bail!("annual_inc is {} but must be non-negative", app.annual_inc);
        }
        if !(0.0..=60.0).contains(&app.dti) {
            bail!("dti is {} but must be between 0 and 60", app.dti);
        }
        if !(600.0..=850.0).contains(&app.fico_range_low) {
            bail!(
                "fico_range_low is {} but must be between 600 and 850",
                app.fico_range_low
            );
        }
        if !(600.0..=850.0).contains(&app.fico_range_high) {
            bail!(
                "fico_range_high is {} but must be between 600 and 850",
                app.fico_range_high
            );
        }
        if app.time_to_earliest_cr_line < 0.0 {
            bail!(
                "time_to_earliest_cr_line is {} but must be non-negative",
                app.time_to_earliest_cr_line
            );
        }

        self.check_numeric_range("loan_amnt", app.loan_amnt)?;
        self.check_numeric_range("int_rate", app.int_rate)?;
        self.check_numeric_range("annual_inc", app.annual_inc)?;
        self.check_numeric_range("dti", app.dti)?;

        let term_options = self.term_options();
        if !term_options.is_empty() && !term_options.iter().any(|o| o == &app.term) {
            bail!(
                "term has unknown value {:?}; valid options: {:?}",
                app.term,
                term_options
            );
        }

        self.check_categorical("home_ownership", &app.home_ownership)?;
        self.check_categorical("purpose", &app.purpose)?;
        self.check_categorical("initial_list_status", &app.initial_list_status)?;
        self.check_categorical("verification_status", &app.verification_status)?;
        self.check_categorical("application_type", &app.application_type)?;

        Ok(())
    }
}

//! Feature assembly for loan default model inference.
//!
//! Builds the full model input row from a submitted application: the
//! collected fields, the derived fields (issue year/month, numeric term),
//! and the background fields filled from the form schema's defaults.
//! Features are assembled in the exact column order the scaler was fit on.

use crate::form::FormSchema;
use crate::types::application::LoanApplication;
use anyhow::{bail, Context, Result};
use chrono::Datelike;

/// Column order the scaler was fit on. Every preprocessing stage operates on
/// rows in this order.
pub const SCALER_FEATURES: [&str; 26] = [
    "sub_grade",
    "term",
    "home_ownership",
    "fico_range_low",
    "total_acc",
    "pub_rec",
    "revol_util",
    "annual_inc",
    "int_rate",
    "dti",
    "purpose",
    "mort_acc",
    "loan_amnt",
    "application_type",
    "installment",
    "verification_status",
    "pub_rec_bankruptcies",
    "addr_state",
    "initial_list_status",
    "fico_range_high",
    "revol_bal",
    "open_acc",
    "emp_length",
    "time_to_earliest_cr_line",
    "issue_year",
    "issue_month",
];

/// Position of a feature in the scaler column order
pub fn feature_index(name: &str) -> Option<usize> {
    SCALER_FEATURES.iter().position(|&f| f == name)
}

/// One slot of an assembled row: numeric, or a category string awaiting
/// label encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

/// An assembled feature row in scaler column order
#[derive(Debug, Clone)]
pub struct FeatureRow {
    values: Vec<FeatureValue>,
}

impl FeatureRow {
    pub fn new(values: Vec<FeatureValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        feature_index(name).and_then(|i| self.values.get(i))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FeatureValue> {
        feature_index(name).and_then(move |i| self.values.get_mut(i))
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    /// Collapse the row to plain numbers. Fails if any slot is still an
    /// unencoded category.
    pub fn into_numbers(self) -> Result<Vec<f64>> {
        self.values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                FeatureValue::Number(n) => Ok(n),
                FeatureValue::Category(c) => {
                    bail!(
                        "feature {} still holds unencoded category {:?}",
                        SCALER_FEATURES[i],
                        c
                    )
                }
            })
            .collect()
    }
}

/// Assembles model input rows from applications and schema defaults.
pub struct FeatureAssembler {
    schema: FormSchema,
}

impl FeatureAssembler {
    pub fn new(schema: FormSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Number of features produced
    pub fn feature_count(&self) -> usize {
        SCALER_FEATURES.len()
    }

    /// Feature names in scaler order
    pub fn feature_names(&self) -> &'static [&'static str] {
        &SCALER_FEATURES
    }

    fn background_numeric(&self, field: &str) -> Result<f64> {
        self.schema
            .numeric_default(field)
            .with_context(|| format!("form schema has no default for numeric field {}", field))
    }

    fn background_category(&self, field: &str) -> Result<String> {
        self.schema
            .first_category(field)
            .map(|s| s.to_string())
            .with_context(|| format!("form schema has no options for categorical field {}", field))
    }

    /// Assemble the 26-column row for one application.
    pub fn assemble(&self, app: &LoanApplication) -> Result<FeatureRow> {
        let issue_year = f64::from(app.issue_date.year());
        let issue_month = f64::from(app.issue_date.month());
        let term_value = if app.term.contains("36") { 3.0 } else { 5.0 };

        let mut values = Vec::with_capacity(SCALER_FEATURES.len());
        for &name in SCALER_FEATURES.iter() {
            let value = match name {
                // Collected fields
                "term" => FeatureValue::Number(term_value),
                "home_ownership" => FeatureValue::Category(app.home_ownership.clone()),
                "fico_range_low" => FeatureValue::Number(app.fico_range_low),
                "annual_inc" => FeatureValue::Number(app.annual_inc),
                "int_rate" => FeatureValue::Number(app.int_rate),
                "dti" => FeatureValue::Number(app.dti),
                "purpose" => FeatureValue::Category(app.purpose.clone()),
                "mort_acc" => FeatureValue::Number(f64::from(app.mort_acc)),
                "loan_amnt" => FeatureValue::Number(app.loan_amnt),
                "application_type" => FeatureValue::Category(app.application_type.clone()),
                "verification_status" => {
                    FeatureValue::Category(app.verification_status.clone())
                }
                "pub_rec_bankruptcies" => {
                    FeatureValue::Number(f64::from(app.pub_rec_bankruptcies))
                }
                "initial_list_status" => {
                    FeatureValue::Category(app.initial_list_status.clone())
                }
                "fico_range_high" => FeatureValue::Number(app.fico_range_high),
                "time_to_earliest_cr_line" => {
                    FeatureValue::Number(app.time_to_earliest_cr_line)
                }

                // Derived fields
                "issue_year" => FeatureValue::Number(issue_year),
                "issue_month" => FeatureValue::Number(issue_month),

                // Background categoricals: first option of the list
                "sub_grade" | "addr_state" => {
                    FeatureValue::Category(self.background_category(name)?)
                }

                // Background numerics: schema default
                _ => FeatureValue::Number(self.background_numeric(name)?),
            };
            values.push(value);
        }

        Ok(FeatureRow::new(values))
    }
}

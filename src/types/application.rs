//! Loan application data structures

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_issue_date() -> NaiveDate {
    Utc::now().date_naive()
}

/// A single loan application as collected by the input form.
///
/// Only the fields the form collects live here; background attributes the
/// model was trained on but the form never asks for (total accounts, revolving
/// balance, ...) are substituted from the form schema's defaults during
/// feature assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanApplication {
    /// Unique application identifier
    #[serde(default = "generate_id")]
    pub application_id: String,

    /// Requested loan amount in dollars
    pub loan_amnt: f64,

    /// Interest rate in percent
    pub int_rate: f64,

    /// Loan term, one of the form's mapped options ("36 months", "60 months")
    pub term: String,

    /// Self-reported annual income
    pub annual_inc: f64,

    /// Home ownership status (rent, mortgage, own, ...)
    pub home_ownership: String,

    /// Stated loan purpose
    pub purpose: String,

    /// Debt-to-income ratio
    pub dti: f64,

    /// Initial listing status of the loan (f = fractional, w = whole)
    pub initial_list_status: String,

    /// Income verification status
    pub verification_status: String,

    /// Individual or joint application
    pub application_type: String,

    /// Number of mortgage accounts
    pub mort_acc: u32,

    /// Number of public record bankruptcies
    pub pub_rec_bankruptcies: u32,

    /// Loan issue date; issue year and month are derived from it
    #[serde(default = "default_issue_date")]
    pub issue_date: NaiveDate,

    /// Lower bound of the applicant's FICO range
    pub fico_range_low: f64,

    /// Upper bound of the applicant's FICO range
    pub fico_range_high: f64,

    /// Months since the applicant's earliest credit line
    pub time_to_earliest_cr_line: f64,

    /// Submission timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl LoanApplication {
    /// Create an application with required amounts and neutral defaults for
    /// the remaining form fields.
    pub fn new(application_id: String, loan_amnt: f64, int_rate: f64) -> Self {
        Self {
            application_id,
            loan_amnt,
            int_rate,
            term: "36 months".to_string(),
            annual_inc: 0.0,
            home_ownership: "RENT".to_string(),
            purpose: "debt_consolidation".to_string(),
            dti: 0.0,
            initial_list_status: "f".to_string(),
            verification_status: "Not Verified".to_string(),
            application_type: "Individual".to_string(),
            mort_acc: 0,
            pub_rec_bankruptcies: 0,
            issue_date: default_issue_date(),
            fico_range_low: 700.0,
            fico_range_high: 740.0,
            time_to_earliest_cr_line: 0.0,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_serialization() {
        let app = LoanApplication::new("app_123".to_string(), 10000.0, 12.5);

        let json = serde_json::to_string(&app).unwrap();
        let deserialized: LoanApplication = serde_json::from_str(&json).unwrap();

        assert_eq!(app.application_id, deserialized.application_id);
        assert_eq!(app.loan_amnt, deserialized.loan_amnt);
        assert_eq!(app.term, deserialized.term);
    }

    #[test]
    fn test_missing_id_is_generated() {
        let json = r#"{
            "loan_amnt": 5000.0,
            "int_rate": 9.1,
            "term": "60 months",
            "annual_inc": 42000.0,
            "home_ownership": "RENT",
            "purpose": "credit_card",
            "dti": 18.2,
            "initial_list_status": "w",
            "verification_status": "Verified",
            "application_type": "Individual",
            "mort_acc": 0,
            "pub_rec_bankruptcies": 0,
            "issue_date": "2024-03-15",
            "fico_range_low": 680.0,
            "fico_range_high": 684.0,
            "time_to_earliest_cr_line": 120.0
        }"#;

        let app: LoanApplication = serde_json::from_str(json).unwrap();
        assert!(!app.application_id.is_empty());
        assert_eq!(app.issue_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }
}

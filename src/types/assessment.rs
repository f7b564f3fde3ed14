//! Risk assessment data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk tier classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    /// Determine the tier from a default probability and thresholds.
    ///
    /// Boundaries are half-open: a probability exactly at `moderate` is
    /// Moderate, exactly at `high` is High.
    pub fn from_probability(probability: f64, thresholds: &RiskTierThresholds) -> Self {
        if probability >= thresholds.high {
            RiskTier::High
        } else if probability >= thresholds.moderate {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    /// Human-readable decision label for the tier.
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk - Approved",
            RiskTier::Moderate => "Moderate Risk - Manual Review",
            RiskTier::High => "High Risk - Likely Default",
        }
    }

    /// Display color (hex) associated with the tier.
    pub fn color(&self) -> &'static str {
        match self {
            RiskTier::Low => "#28a745",
            RiskTier::Moderate => "#ff8c00",
            RiskTier::High => "#dc3545",
        }
    }
}

/// Configurable tier thresholds on the default probability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTierThresholds {
    pub moderate: f64,
    pub high: f64,
}

impl Default for RiskTierThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.3,
            high: 0.6,
        }
    }
}

/// Result of scoring one loan application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// Associated application ID
    pub application_id: String,

    /// Probability of default (0.0 - 1.0)
    pub probability_of_default: f64,

    /// Risk tier classification
    pub risk_tier: RiskTier,

    /// Name of the model that produced the score
    pub model: String,

    /// Assessment generation timestamp
    pub timestamp: DateTime<Utc>,

    /// Requested loan amount from the application
    pub loan_amnt: f64,

    /// Loan purpose from the application
    pub purpose: String,

    /// Loan term from the application
    pub term: String,
}

impl RiskAssessment {
    /// Create a new assessment
    pub fn new(
        application_id: String,
        probability_of_default: f64,
        risk_tier: RiskTier,
        model: String,
    ) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            application_id,
            probability_of_default,
            risk_tier,
            model,
            timestamp: Utc::now(),
            loan_amnt: 0.0,
            purpose: String::new(),
            term: String::new(),
        }
    }

    /// Attach application details for reporting
    pub fn with_application_details(
        mut self,
        loan_amnt: f64,
        purpose: String,
        term: String,
    ) -> Self {
        self.loan_amnt = loan_amnt;
        self.purpose = purpose;
        self.term = term;
        self
    }

    /// Probability expressed as a percentage
    pub fn risk_pct(&self) -> f64 {
        self.probability_of_default * 100.0
    }

    /// Plain-text summary of the assessment, one line per field.
    ///
    /// This is the textual rendition of the result panel; any widget layer
    /// is out of scope.
    pub fn render(&self) -> String {
        format!(
            "{}\nProbability of Default: {:.2}%\nColor: {}",
            self.risk_tier.label(),
            self.risk_pct(),
            self.risk_tier.color()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_from_probability() {
        let thresholds = RiskTierThresholds::default();

        assert_eq!(
            RiskTier::from_probability(0.1, &thresholds),
            RiskTier::Low
        );
        assert_eq!(
            RiskTier::from_probability(0.45, &thresholds),
            RiskTier::Moderate
        );
        assert_eq!(
            RiskTier::from_probability(0.75, &thresholds),
            RiskTier::High
        );
    }

    #[test]
    fn test_tier_boundaries_are_half_open() {
        let thresholds = RiskTierThresholds::default();

        assert_eq!(
            RiskTier::from_probability(0.3, &thresholds),
            RiskTier::Moderate
        );
        assert_eq!(
            RiskTier::from_probability(0.6, &thresholds),
            RiskTier::High
        );
    }

    #[test]
    fn test_assessment_serialization() {
        let assessment = RiskAssessment::new(
            "app_123".to_string(),
            0.42,
            RiskTier::Moderate,
            "gradient_boosting".to_string(),
        )
        .with_application_details(12000.0, "credit_card".to_string(), "36 months".to_string());

        let json = serde_json::to_string(&assessment).unwrap();
        let deserialized: RiskAssessment = serde_json::from_str(&json).unwrap();

        assert_eq!(assessment.application_id, deserialized.application_id);
        assert_eq!(
            assessment.probability_of_default,
            deserialized.probability_of_default
        );
        assert_eq!(assessment.risk_tier, deserialized.risk_tier);
        assert_eq!(deserialized.loan_amnt, 12000.0);
    }

    #[test]
    fn test_render_contains_label_and_pct() {
        let assessment = RiskAssessment::new(
            "app_9".to_string(),
            0.715,
            RiskTier::High,
            "gradient_boosting".to_string(),
        );

        let rendered = assessment.render();
        assert!(rendered.contains("High Risk - Likely Default"));
        assert!(rendered.contains("71.50%"));
        assert!(rendered.contains("#dc3545"));
    }
}

//! Core data types for the scoring pipeline

pub mod application;
pub mod assessment;

pub use application::LoanApplication;
pub use assessment::{RiskAssessment, RiskTier, RiskTierThresholds};

//! Credit Risk Scorer Library
//!
//! A loan default prediction pipeline: applicant attributes are run through
//! a fixed preprocessing chain (feature assembly, outlier clipping,
//! categorical encoding, scaling, feature selection) and scored by a
//! pre-trained gradient-boosting model exported to ONNX.

pub mod config;
pub mod features;
pub mod form;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod stats;
pub mod types;

pub use config::AppConfig;
pub use features::FeatureAssembler;
pub use form::FormSchema;
pub use models::inference::InferenceEngine;
pub use pipeline::ScoringPipeline;
pub use preprocess::Preprocessor;
pub use types::{application::LoanApplication, assessment::RiskAssessment};

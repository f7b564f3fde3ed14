//! End-to-end scoring pipeline.
//!
//! Wires the trained artifacts together and exposes the single in-process
//! call: validate an application, assemble its feature row, run the fitted
//! preprocessing, score it, and bucket the result.

use crate::config::AppConfig;
use crate::features::FeatureAssembler;
use crate::form::FormSchema;
use crate::models::inference::InferenceEngine;
use crate::preprocess::{bundle::PreprocessBundle, Preprocessor};
use crate::types::application::LoanApplication;
use crate::types::assessment::{RiskAssessment, RiskTierThresholds};
use anyhow::{Context, Result};
use tracing::{debug, info};

/// The assembled scoring pipeline
pub struct ScoringPipeline {
    assembler: FeatureAssembler,
    preprocessor: Preprocessor,
    engine: InferenceEngine,
    thresholds: RiskTierThresholds,
}

impl ScoringPipeline {
    /// Build the pipeline from configuration, loading all three artifacts.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let schema = FormSchema::load_from_path(&config.artifacts.form_schema)
            .context("Failed to load form schema artifact")?;
        let bundle = PreprocessBundle::load_from_path(&config.artifacts.bundle)
            .context("Failed to load preprocessing bundle artifact")?;
        let engine = InferenceEngine::new(config)?;

        Self::new(schema, bundle, engine, config.scoring.risk_tiers.clone())
    }

    /// Build the pipeline from already-loaded artifacts.
    pub fn new(
        schema: FormSchema,
        bundle: PreprocessBundle,
        engine: InferenceEngine,
        thresholds: RiskTierThresholds,
    ) -> Result<Self> {
        let outlier_bounds = schema.outlier_bounds.clone();
        let preprocessor = Preprocessor::new(bundle, outlier_bounds)?;
        let assembler = FeatureAssembler::new(schema);

        info!(
            features = assembler.feature_count(),
            selected = preprocessor.selected_count(),
            model = %engine.model_name(),
            "Scoring pipeline initialized"
        );

        Ok(Self {
            assembler,
            preprocessor,
            engine,
            thresholds,
        })
    }

    /// Form schema used for validation and defaults
    pub fn schema(&self) -> &FormSchema {
        self.assembler.schema()
    }

    /// Score one application.
    pub fn assess(&self, application: &LoanApplication) -> Result<RiskAssessment> {
        self.schema()
            .validate(application)
            .with_context(|| format!("Invalid application {}", application.application_id))?;

        let row = self.assembler.assemble(application)?;
        let features = self.preprocessor.apply(row)?;
        let prediction = self.engine.predict(&features)?;

        let assessment = prediction.to_assessment(application, &self.thresholds);

        debug!(
            application_id = %application.application_id,
            probability = assessment.probability_of_default,
            risk_tier = ?assessment.risk_tier,
            "Application assessed"
        );

        Ok(assessment)
    }
}

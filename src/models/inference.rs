//! Default-probability inference over the ONNX classifier

use crate::config::AppConfig;
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::types::application::LoanApplication;
use crate::types::assessment::{RiskAssessment, RiskTier, RiskTierThresholds};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Result of scoring one feature vector
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Probability of default (0.0 - 1.0)
    pub probability: f64,
    /// Name of the model that produced the score
    pub model: String,
}

impl Prediction {
    /// Convert the prediction into a risk assessment for an application
    pub fn to_assessment(
        &self,
        application: &LoanApplication,
        thresholds: &RiskTierThresholds,
    ) -> RiskAssessment {
        let probability = self.probability.clamp(0.0, 1.0);
        let tier = RiskTier::from_probability(probability, thresholds);

        RiskAssessment::new(
            application.application_id.clone(),
            probability,
            tier,
            self.model.clone(),
        )
        .with_application_details(
            application.loan_amnt,
            application.purpose.clone(),
            application.term.clone(),
        )
    }
}

/// Inference engine wrapping the ONNX classifier session.
///
/// The session requires mutable access to run, so it lives behind a lock.
pub struct InferenceEngine {
    model: RwLock<LoadedModel>,
    model_name: String,
}

impl InferenceEngine {
    /// Create an inference engine from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_model_path(
            &config.artifacts.model,
            &config.artifacts.model_name,
            config.artifacts.onnx_threads,
        )
    }

    /// Create an inference engine from an explicit model path
    pub fn with_model_path(path: &str, name: &str, onnx_threads: usize) -> Result<Self> {
        let loader = ModelLoader::with_threads(onnx_threads)?;
        let model = loader.load_model(path, name)?;

        Ok(Self {
            model: RwLock::new(model),
            model_name: name.to_string(),
        })
    }

    /// Name of the loaded model
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Score one feature vector, returning the probability of default.
    pub fn predict(&self, features: &[f32]) -> Result<Prediction> {
        let mut model = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let probability = self.run_model(&mut model, features)?;

        debug!(
            model = %self.model_name,
            probability = probability,
            "Inference complete"
        );

        Ok(Prediction {
            probability,
            model: self.model_name.clone(),
        })
    }

    /// Run the session on a [1, n] input tensor
    fn run_model(&self, model: &mut LoadedModel, features: &[f32]) -> Result<f64> {
        use ort::value::Tensor;

        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let model_name = model.name.clone();
        let output_name = model.output_name.clone();

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        self.extract_probability(&outputs, &output_name, &model_name)
    }

    /// Extract the default probability from model output.
    /// Handles both tensor outputs and seq(map) outputs (sklearn exporters
    /// commonly emit seq(map(int64, float)) via ZipMap).
    fn extract_probability(
        &self,
        outputs: &ort::session::SessionOutputs,
        output_name: &str,
        model_name: &str,
    ) -> Result<f64> {
        // First, try to get the probabilities output by name
        if let Some(output) = outputs.get(output_name) {
            let dtype = output.dtype();

            // Tensor format
            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                let prob = self.positive_class_prob_from_tensor(&shape, data);
                debug!(model = %model_name, prob = prob, "Extracted from tensor");
                return Ok(prob);
            }

            // Sequence format - seq(map(int64, float))
            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = self.extract_from_sequence_map(output, model_name) {
                    return Ok(prob);
                }
            }
        }

        // Fallback: iterate all outputs and try extraction
        for (name, output) in outputs.iter() {
            // Skip the class-label output
            if name.contains("label") {
                continue;
            }

            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                let prob = self.positive_class_prob_from_tensor(&shape, data);
                debug!(model = %model_name, output = %name, prob = prob, "Extracted from tensor (fallback)");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = self.extract_from_sequence_map(&output, model_name) {
                    return Ok(prob);
                }
            }
        }

        warn!(model = %model_name, "Could not extract probability, using default 0.5");
        Ok(0.5)
    }

    /// Extract probability from seq(map(int64, float)) format
    fn extract_from_sequence_map(
        &self,
        output: &ort::value::DynValue,
        model_name: &str,
    ) -> Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

        if maps.is_empty() {
            return Err(anyhow::anyhow!("Empty sequence"));
        }

        // Batch size is 1, so only the first map matters
        let map_value = &maps[0];
        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

        // Class 1 is the default class
        for (class_id, prob) in &kv_pairs {
            if *class_id == 1 {
                debug!(
                    model = %model_name,
                    prob = *prob,
                    "Extracted from seq(map)"
                );
                return Ok(f64::from(*prob));
            }
        }

        // If no class 1, invert the class 0 probability
        for (class_id, prob) in &kv_pairs {
            if *class_id == 0 {
                return Ok(1.0 - f64::from(*prob));
            }
        }

        Err(anyhow::anyhow!("No probability found in map"))
    }

    /// Extract the positive-class probability from tensor data
    fn positive_class_prob_from_tensor(&self, shape: &ort::tensor::Shape, data: &[f32]) -> f64 {
        let dims: Vec<i64> = shape.iter().copied().collect();

        if dims.len() == 2 {
            let num_classes = dims[1] as usize;
            if num_classes >= 2 {
                // [batch, num_classes] - probability of class 1
                return f64::from(data[1]);
            } else if num_classes == 1 {
                // [batch, 1] - single probability
                return f64::from(data[0]);
            }
        } else if dims.len() == 1 {
            let num_classes = dims[0] as usize;
            if num_classes >= 2 {
                return f64::from(data[1]);
            } else if num_classes == 1 {
                return f64::from(data[0]);
            }
        }

        // Fallback: return last value
        data.last().map(|&v| f64::from(v)).unwrap_or(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_to_assessment() {
        let prediction = Prediction {
            probability: 0.42,
            model: "gradient_boosting".to_string(),
        };

        let mut app = LoanApplication::new("app_7".to_string(), 8000.0, 10.9);
        app.purpose = "home_improvement".to_string();

        let assessment =
            prediction.to_assessment(&app, &RiskTierThresholds::default());

        assert_eq!(assessment.application_id, "app_7");
        assert_eq!(assessment.risk_tier, RiskTier::Moderate);
        assert_eq!(assessment.probability_of_default, 0.42);
        assert_eq!(assessment.purpose, "home_improvement");
        assert_eq!(assessment.model, "gradient_boosting");
    }

    #[test]
    fn test_out_of_range_probability_is_clamped() {
        let prediction = Prediction {
            probability: 1.2,
            model: "gradient_boosting".to_string(),
        };

        let app = LoanApplication::new("app_8".to_string(), 8000.0, 10.9);
        let assessment =
            prediction.to_assessment(&app, &RiskTierThresholds::default());

        assert_eq!(assessment.probability_of_default, 1.0);
        assert_eq!(assessment.risk_tier, RiskTier::High);
    }

    // Session-backed tests require the ONNX model artifact
}

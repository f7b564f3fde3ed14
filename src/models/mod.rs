//! ONNX model loading and inference

pub mod inference;
pub mod loader;

pub use inference::{InferenceEngine, Prediction};
pub use loader::{LoadedModel, ModelLoader};

//! Model host: deserializes a pre-fit transformation+classification pipeline
//! once at startup and exposes synchronous transform-and-predict.

mod classifier;
mod error;
mod host;
#[cfg(feature = "onnx")]
mod onnx;
pub mod pipeline;

pub use classifier::{Classifier, Prediction};
pub use error::ModelError;
pub use host::{ModelHost, ModelInfo};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use pipeline::{Pipeline, PipelineArtifact};

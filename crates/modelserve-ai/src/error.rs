use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt model artifact {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("unsupported model format: {0} (expected .json or .onnx)")]
    UnsupportedFormat(PathBuf),

    #[error("expected {expected} features, got {got}")]
    Arity { expected: usize, got: usize },

    #[error("feature schema mismatch: model expects {model:?}, deployment sends {deployment:?}")]
    SchemaMismatch {
        model: Vec<String>,
        deployment: Vec<String>,
    },

    #[error("model produced a non-finite value")]
    Numeric,

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Onnx(#[from] ort::Error),

    #[error("{0}")]
    Other(String),
}

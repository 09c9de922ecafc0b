//! Load-once, read-many holder of the deployment's model.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::classifier::{Classifier, Prediction};
use crate::error::ModelError;
use crate::pipeline::{Pipeline, PipelineArtifact};

/// Summary of the loaded model, for startup logs and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub source: PathBuf,
    pub backend: &'static str,
    pub n_features: usize,
    pub feature_names: Option<Vec<String>>,
    pub classes: Vec<i64>,
}

/// The deserialized model artifact, held for the lifetime of the process.
///
/// Built once at startup; there is no way to swap the model afterwards.
/// All methods take `&self`, so the host is shared between request handlers
/// behind an `Arc`.
pub struct ModelHost {
    classifier: Box<dyn Classifier>,
    source: PathBuf,
}

impl std::fmt::Debug for ModelHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHost")
            .field("name", &self.classifier.name())
            .field("backend", &self.classifier.backend())
            .field("source", &self.source)
            .finish()
    }
}

impl ModelHost {
    /// Load an artifact from disk, choosing the backend from the file extension.
    ///
    /// A missing, unreadable or inconsistent artifact is an error; callers
    /// treat it as fatal.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let classifier: Box<dyn Classifier> = match extension.as_deref() {
            Some("json") => Box::new(load_pipeline(path)?),
            #[cfg(feature = "onnx")]
            Some("onnx") => Box::new(crate::onnx::OnnxClassifier::load(path)?),
            _ => return Err(ModelError::UnsupportedFormat(path.to_path_buf())),
        };

        let host = Self {
            classifier,
            source: path.to_path_buf(),
        };
        info!(
            model = host.classifier.name(),
            backend = host.classifier.backend(),
            path = %path.display(),
            n_features = host.classifier.n_features(),
            "loaded model artifact"
        );
        Ok(host)
    }

    /// Wrap an already-built classifier.
    pub fn from_classifier(classifier: Box<dyn Classifier>, source: impl Into<PathBuf>) -> Self {
        Self {
            classifier,
            source: source.into(),
        }
    }

    /// Transform and predict one feature vector.
    pub fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError> {
        let expected = self.classifier.n_features();
        if features.len() != expected {
            return Err(ModelError::Arity {
                expected,
                got: features.len(),
            });
        }
        let prediction = self.classifier.predict(features)?;
        debug!(label = prediction.label, "model prediction");
        Ok(prediction)
    }

    /// Probability of `label` for the given features, if the backend is probabilistic.
    pub fn probability_of(&self, prediction: &Prediction, label: i64) -> Option<f64> {
        prediction.probability_of(label, self.classifier.classes())
    }

    /// Confirm the artifact was trained on `expected` features, in order.
    ///
    /// Formats without recorded names are checked on arity only.
    pub fn check_schema(&self, expected: &[&str]) -> Result<(), ModelError> {
        let matches = match self.classifier.feature_names() {
            Some(names) => names.iter().map(String::as_str).eq(expected.iter().copied()),
            None => self.classifier.n_features() == expected.len(),
        };
        if matches {
            return Ok(());
        }
        Err(ModelError::SchemaMismatch {
            model: self
                .classifier
                .feature_names()
                .map(<[String]>::to_vec)
                .unwrap_or_else(|| vec![format!("<{} unnamed>", self.classifier.n_features())]),
            deployment: expected.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn describe(&self) -> ModelInfo {
        ModelInfo {
            name: self.classifier.name().to_string(),
            source: self.source.clone(),
            backend: self.classifier.backend(),
            n_features: self.classifier.n_features(),
            feature_names: self.classifier.feature_names().map(<[String]>::to_vec),
            classes: self.classifier.classes().to_vec(),
        }
    }
}

fn load_pipeline(path: &Path) -> Result<Pipeline, ModelError> {
    let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let artifact: PipelineArtifact =
        serde_json::from_str(&text).map_err(|source| ModelError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
    Pipeline::from_artifact(artifact).map_err(|reason| ModelError::Invalid {
        path: path.to_path_buf(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn models_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
    }

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let err = ModelHost::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn corrupt_artifact() {
        let file = write_temp(".json", "{ this is not json");
        let err = ModelHost::load(file.path()).unwrap_err();
        assert!(matches!(err, ModelError::Corrupt { .. }), "got {err:?}");
    }

    #[test]
    fn inconsistent_artifact() {
        let file = write_temp(
            ".json",
            r#"{"name":"bad","feature_names":["a","b"],"classes":[0,1],
               "estimator":{"type":"logistic_regression","coef":[[1.0]],"intercept":[0.0]}}"#,
        );
        let err = ModelHost::load(file.path()).unwrap_err();
        assert!(matches!(err, ModelError::Invalid { .. }), "got {err:?}");
    }

    #[test]
    fn unknown_extension() {
        let file = write_temp(".joblib", "\u{80}\u{04}");
        let err = ModelHost::load(file.path()).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat(_)));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn onnx_needs_the_feature() {
        let file = write_temp(".onnx", "graph");
        let err = ModelHost::load(file.path()).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat(_)), "got {err:?}");
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn onnx_extension_uses_the_onnx_backend() {
        let file = write_temp(".onnx", "graph");
        let err = ModelHost::load(file.path()).unwrap_err();
        assert!(
            matches!(err, ModelError::Onnx(_) | ModelError::Invalid { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let host = ModelHost::load(&models_dir().join("purchase.json")).unwrap();
        let err = host.predict(&[0.0, 30.0]).unwrap_err();
        assert!(matches!(err, ModelError::Arity { expected: 3, got: 2 }));
    }

    #[test]
    fn bundled_iris_model() {
        let host = ModelHost::load(&models_dir().join("iris.json")).unwrap();
        host.check_schema(&["sepal_length", "sepal_width", "petal_length", "petal_width"])
            .unwrap();

        assert_eq!(host.predict(&[5.1, 3.5, 1.4, 0.2]).unwrap().label, 0);
        assert_eq!(host.predict(&[5.8, 3.0, 4.0, 1.2]).unwrap().label, 1);
        assert_eq!(host.predict(&[6.7, 3.0, 5.2, 2.3]).unwrap().label, 2);

        let info = host.describe();
        assert_eq!(info.classes, vec![0, 1, 2]);
        assert_eq!(info.backend, "pipeline");
    }

    #[test]
    fn bundled_purchase_model() {
        let host = ModelHost::load(&models_dir().join("purchase.json")).unwrap();
        host.check_schema(&["gender", "age", "estimated_salary"])
            .unwrap();

        let young = host.predict(&[0.0, 30.0, 50_000.0]).unwrap();
        assert_eq!(young.label, 0);
        let p = host.probability_of(&young, 1).unwrap();
        assert!((0.0..0.5).contains(&p));

        let older = host.predict(&[1.0, 55.0, 140_000.0]).unwrap();
        assert_eq!(older.label, 1);
        assert!(host.probability_of(&older, 1).unwrap() > 0.5);
    }

    #[test]
    fn schema_mismatch_is_reported() {
        let host = ModelHost::load(&models_dir().join("purchase.json")).unwrap();
        let err = host
            .check_schema(&["age", "gender", "estimated_salary"])
            .unwrap_err();
        assert!(matches!(err, ModelError::SchemaMismatch { .. }));
    }
}

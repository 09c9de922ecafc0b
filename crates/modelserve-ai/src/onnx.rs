//! ONNX Runtime backend for classifiers converted with skl2onnx (`zipmap=False`).
//!
//! The graph must take a single float input of shape `[1, n_features]` and
//! produce the predicted label (int64) as output 0 and the class
//! probabilities (float `[1, n_classes]`) as output 1.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::classifier::{Classifier, Prediction};
use crate::error::ModelError;

pub struct OnnxClassifier {
    /// `Session::run` needs exclusive access, so concurrent callers queue here.
    session: Mutex<Session>,
    input_name: String,
    n_features: usize,
    classes: Vec<i64>,
    name: String,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let session = Session::builder()?.commit_from_file(path)?;

        let input = session
            .inputs()
            .first()
            .ok_or_else(|| invalid(path, "graph has no inputs"))?;
        let input_name = input.name().to_string();
        let n_features =
            last_dim(input.dtype()).ok_or_else(|| invalid(path, "input width is not fixed"))?;

        let n_classes = session
            .outputs()
            .get(1)
            .and_then(|o| last_dim(o.dtype()))
            .ok_or_else(|| invalid(path, "missing fixed-width probability output"))?;
        if n_classes < 2 {
            return Err(invalid(path, "need at least 2 classes"));
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(
            model = %path.display(),
            n_features,
            n_classes,
            "loaded onnx classifier"
        );
        Ok(Self {
            session: Mutex::new(session),
            input_name,
            n_features,
            classes: (0..n_classes as i64).collect(),
            name,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError> {
        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let shape = [1i64, self.n_features as i64];
        let tensor = Tensor::from_array((shape, data.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::Other("onnx session lock poisoned".into()))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => tensor])?;

        let (_, labels) = outputs[0].try_extract_tensor::<i64>()?;
        let label = *labels.first().ok_or(ModelError::Numeric)?;

        let (_, probs) = outputs[1].try_extract_tensor::<f32>()?;
        let probabilities: Vec<f64> = probs
            .iter()
            .take(self.classes.len())
            .map(|&p| p as f64)
            .collect();
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::Numeric);
        }

        Ok(Prediction {
            label,
            probabilities: Some(probabilities),
        })
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn invalid(path: &Path, reason: &str) -> ModelError {
    ModelError::Invalid {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Last dimension of a tensor type, when it is fixed.
fn last_dim(value_type: &ort::value::ValueType) -> Option<usize> {
    match value_type {
        ort::value::ValueType::Tensor { shape, .. } => fixed_last_dim(shape),
        _ => None,
    }
}

/// Dynamic axes are reported as `-1`.
fn fixed_last_dim(shape: &[i64]) -> Option<usize> {
    shape
        .last()
        .and_then(|&d| if d > 0 { Some(d as usize) } else { None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn fixed_width_is_read_from_the_last_axis() {
        assert_eq!(fixed_last_dim(&[1, 4]), Some(4));
        assert_eq!(fixed_last_dim(&[-1, 3]), Some(3));
    }

    #[test]
    fn dynamic_or_empty_shapes_have_no_width() {
        assert_eq!(fixed_last_dim(&[1, -1]), None);
        assert_eq!(fixed_last_dim(&[-1, 0]), None);
        assert_eq!(fixed_last_dim(&[]), None);
    }

    #[test]
    fn garbage_graph_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        file.write_all(b"definitely not a protobuf graph").unwrap();

        let Err(err) = OnnxClassifier::load(file.path()) else {
            panic!("garbage graph loaded");
        };
        assert!(
            matches!(err, ModelError::Onnx(_) | ModelError::Invalid { .. }),
            "got {err:?}"
        );
    }
}

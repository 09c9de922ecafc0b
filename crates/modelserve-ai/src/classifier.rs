//! The seam between the model host and the concrete inference backends.

use crate::error::ModelError;

/// Output of one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted class label.
    pub label: i64,
    /// Per-class probabilities, aligned with [`Classifier::classes`], when the
    /// backend is probabilistic.
    pub probabilities: Option<Vec<f64>>,
}

impl Prediction {
    /// Probability assigned to `label`, if the backend reports probabilities
    /// and the label is one of `classes`.
    pub fn probability_of(&self, label: i64, classes: &[i64]) -> Option<f64> {
        let idx = classes.iter().position(|&c| c == label)?;
        self.probabilities.as_ref()?.get(idx).copied()
    }
}

/// A loaded, immutable transform-and-predict pipeline.
///
/// Implementations are read-only after construction, so a single instance
/// can serve any number of concurrent callers.
pub trait Classifier: Send + Sync {
    /// Run one fixed-order feature vector through the pipeline.
    ///
    /// Callers guarantee `features.len() == self.n_features()`.
    fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError>;

    fn n_features(&self) -> usize;

    /// Class labels in probability order.
    fn classes(&self) -> &[i64];

    /// Feature names recorded in the artifact, when the format carries them.
    fn feature_names(&self) -> Option<&[String]>;

    /// Short backend identifier for logs (`"pipeline"`, `"onnx"`).
    fn backend(&self) -> &'static str;

    fn name(&self) -> &str;
}

/// Index of the largest value; ties resolve to the lowest index.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

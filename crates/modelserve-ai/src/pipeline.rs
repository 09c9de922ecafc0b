//! Exported scikit-learn style pipelines: optional standard scaling followed
//! by a logistic-regression estimator.
//!
//! The artifact is a JSON document:
//!
//! ```json
//! {
//!   "name": "purchase-logreg",
//!   "feature_names": ["gender", "age", "estimated_salary"],
//!   "classes": [0, 1],
//!   "scaler": { "mean": [0.49, 37.66, 69742.5], "scale": [0.5, 10.47, 34054.3] },
//!   "estimator": { "type": "logistic_regression", "coef": [[0.1, 2.4, 1.2]], "intercept": [-1.1] }
//! }
//! ```
//!
//! A binary model carries a single coefficient row and is squashed with the
//! sigmoid; a multiclass model carries one row per class and uses the softmax.

use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, Prediction, argmax};
use crate::error::ModelError;

/// On-disk representation of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub name: String,
    pub feature_names: Vec<String>,
    pub classes: Vec<i64>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub estimator: Estimator,
}

/// `(x - mean) / scale`, per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, features: &mut [f64]) {
        for ((x, m), s) in features.iter_mut().zip(&self.mean).zip(&self.scale) {
            *x = (*x - m) / s;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
}

/// A checked, ready-to-run pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    artifact: PipelineArtifact,
}

impl Pipeline {
    /// Check an artifact's internal consistency.
    ///
    /// Returns the reason on failure; the caller attaches the source path.
    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self, String> {
        let n = artifact.feature_names.len();
        if n == 0 {
            return Err("no features declared".into());
        }
        if artifact.classes.len() < 2 {
            return Err(format!(
                "need at least 2 classes, found {}",
                artifact.classes.len()
            ));
        }

        if let Some(scaler) = &artifact.scaler {
            if scaler.mean.len() != n || scaler.scale.len() != n {
                return Err(format!(
                    "scaler has {} means and {} scales for {n} features",
                    scaler.mean.len(),
                    scaler.scale.len()
                ));
            }
            if scaler.scale.iter().any(|&s| s == 0.0 || !s.is_finite()) {
                return Err("scaler scale must be finite and non-zero".into());
            }
        }

        let Estimator::LogisticRegression { coef, intercept } = &artifact.estimator;
        let expected_rows = if artifact.classes.len() == 2 {
            1
        } else {
            artifact.classes.len()
        };
        if coef.len() != expected_rows {
            return Err(format!(
                "{} classes need {expected_rows} coefficient row(s), found {}",
                artifact.classes.len(),
                coef.len()
            ));
        }
        if intercept.len() != expected_rows {
            return Err(format!(
                "{} classes need {expected_rows} intercept(s), found {}",
                artifact.classes.len(),
                intercept.len()
            ));
        }
        if let Some(row) = coef.iter().find(|row| row.len() != n) {
            return Err(format!(
                "coefficient row has {} entries for {n} features",
                row.len()
            ));
        }

        Ok(Self { artifact })
    }

    fn probabilities(&self, x: &[f64]) -> Vec<f64> {
        let Estimator::LogisticRegression { coef, intercept } = &self.artifact.estimator;
        let decision: Vec<f64> = coef
            .iter()
            .zip(intercept)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect();

        if decision.len() == 1 {
            let p = sigmoid(decision[0]);
            vec![1.0 - p, p]
        } else {
            softmax(&decision)
        }
    }
}

impl Classifier for Pipeline {
    fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError> {
        let mut x = features.to_vec();
        if let Some(scaler) = &self.artifact.scaler {
            scaler.transform(&mut x);
        }

        let probabilities = self.probabilities(&x);
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::Numeric);
        }
        let idx = argmax(&probabilities).ok_or(ModelError::Numeric)?;

        Ok(Prediction {
            label: self.artifact.classes[idx],
            probabilities: Some(probabilities),
        })
    }

    fn n_features(&self) -> usize {
        self.artifact.feature_names.len()
    }

    fn classes(&self) -> &[i64] {
        &self.artifact.classes
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.artifact.feature_names)
    }

    fn backend(&self) -> &'static str {
        "pipeline"
    }

    fn name(&self) -> &str {
        &self.artifact.name
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable softmax.
fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

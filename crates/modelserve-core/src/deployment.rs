use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::{iris, purchase};

/// Which of the two demo applications a process serves.
///
/// A process hosts exactly one deployment: one model, one prediction route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deployment {
    Iris,
    Purchase,
}

#[derive(Debug, Error)]
#[error("unknown deployment {0:?} (expected \"iris\" or \"purchase\")")]
pub struct UnknownDeployment(pub String);

impl Deployment {
    pub const ALL: [Deployment; 2] = [Self::Iris, Self::Purchase];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iris => "iris",
            Self::Purchase => "purchase",
        }
    }

    /// Feature order the deployment's model must accept.
    pub fn feature_names(&self) -> &'static [&'static str] {
        match self {
            Self::Iris => &iris::FEATURE_NAMES,
            Self::Purchase => &purchase::FEATURE_NAMES,
        }
    }

    /// Route of the prediction endpoint.
    pub fn predict_path(&self) -> &'static str {
        match self {
            Self::Iris => "/predict",
            Self::Purchase => "/ml/predict",
        }
    }

    pub fn welcome_message(&self) -> &'static str {
        match self {
            Self::Iris => "Welcome to the Iris species prediction API",
            Self::Purchase => "Welcome to the purchase prediction API 🚀",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Iris => "🌸 Iris prediction",
            Self::Purchase => "🛒 Purchase prediction",
        }
    }

    /// Artifact path used when none is configured.
    pub fn default_model_path(&self) -> &'static str {
        match self {
            Self::Iris => "models/iris.json",
            Self::Purchase => "models/purchase.json",
        }
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Deployment {
    type Err = UnknownDeployment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iris" => Ok(Self::Iris),
            "purchase" => Ok(Self::Purchase),
            _ => Err(UnknownDeployment(s.to_string())),
        }
    }
}

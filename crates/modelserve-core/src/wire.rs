//! Response records exchanged between the prediction service and its clients.
//!
//! One record per endpoint, serialized through a fixed schema. Clients reject
//! responses carrying fields they do not know about.

use serde::{Deserialize, Serialize};

/// `GET /` liveness payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Welcome {
    pub message: String,
}

/// `GET /predict` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IrisPrediction {
    pub prediction: i64,
}

/// `POST /ml/predict` response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PurchasePrediction {
    pub prediction: i64,
    /// Probability of the positive class, rounded to 4 decimal places.
    pub probability: f64,
}

impl PurchasePrediction {
    pub fn new(prediction: i64, probability: f64) -> Self {
        Self {
            prediction,
            probability: round_to(probability, 4),
        }
    }
}

/// Body of a 404 or 500 response. Only validation failures describe their cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorMessage {
    pub detail: String,
}

impl ErrorMessage {
    pub fn internal() -> Self {
        Self {
            detail: "Internal Server Error".to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            detail: "Not Found".to_string(),
        }
    }
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

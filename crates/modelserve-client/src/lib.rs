//! HTTP client for the prediction service's liveness and prediction endpoints.

pub mod http;

pub use http::{ClientError, PredictionClient};

/// Where the dashboard and CLI look for the service unless told otherwise.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

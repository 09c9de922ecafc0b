//! Typed requests against a running prediction service.

use std::time::Duration;

use modelserve_core::{
    Deployment, IrisMeasurements, IrisPrediction, PurchasePrediction, PurchaseProfile,
    ValidationErrors, Welcome,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
pub const PREDICT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// The service could not be reached at all, or did not answer in time.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect() || e.is_timeout())
    }

    /// Field-level detail of a 422 response.
    pub fn validation(&self) -> Option<ValidationErrors> {
        match self {
            Self::Server { status, body }
                if *status == StatusCode::UNPROCESSABLE_ENTITY.as_u16() =>
            {
                serde_json::from_str(body).ok()
            }
            _ => None,
        }
    }
}

/// Client for one prediction service instance.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: reqwest::Client,
    base_url: String,
}

impl PredictionClient {
    /// `base_url` is like `http://127.0.0.1:8000`; a trailing slash is dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Hit the liveness endpoint. Says nothing about model health.
    pub async fn probe(&self) -> Result<Welcome, ClientError> {
        let url = format!("{}/", self.base_url);
        debug!(url = %url, "probing prediction service");
        let resp = self.client.get(&url).timeout(PROBE_TIMEOUT).send().await?;
        decode(resp).await
    }

    pub async fn predict_iris(
        &self,
        measurements: &IrisMeasurements,
    ) -> Result<IrisPrediction, ClientError> {
        let url = self.predict_url(Deployment::Iris);
        info!(url = %url, ?measurements, "requesting iris prediction");
        let resp = self
            .client
            .get(&url)
            .query(measurements)
            .timeout(PREDICT_TIMEOUT)
            .send()
            .await?;
        let prediction: IrisPrediction = decode(resp).await?;
        info!(label = prediction.prediction, "iris prediction received");
        Ok(prediction)
    }

    pub async fn predict_purchase(
        &self,
        profile: &PurchaseProfile,
    ) -> Result<PurchasePrediction, ClientError> {
        let url = self.predict_url(Deployment::Purchase);
        info!(url = %url, ?profile, "requesting purchase prediction");
        let resp = self
            .client
            .post(&url)
            .json(profile)
            .timeout(PREDICT_TIMEOUT)
            .send()
            .await?;
        let prediction: PurchasePrediction = decode(resp).await?;
        info!(
            label = prediction.prediction,
            probability = prediction.probability,
            "purchase prediction received"
        );
        Ok(prediction)
    }

    fn predict_url(&self, deployment: Deployment) -> String {
        format!("{}{}", self.base_url, deployment.predict_path())
    }
}

/// Anything but a 200 with a body matching `T` exactly is an error.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status != StatusCode::OK {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Server {
            status: status.as_u16(),
            body,
        });
    }
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}

//! Submission lifecycle: `idle → submitting → {success, error} → idle`.

use chrono::{DateTime, Utc};
use modelserve_client::PredictionClient;
use modelserve_core::{PurchaseOutcome, SpeciesDisplay};
use tracing::{debug, info, warn};

use crate::error::DashboardError;
use crate::form::Input;

/// A rendered prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Species {
        label: i64,
        display: SpeciesDisplay,
    },
    Purchase {
        label: i64,
        probability: f64,
        outcome: PurchaseOutcome,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Submitting,
    Success(Outcome),
    Error(String),
}

#[derive(Debug)]
pub enum Event {
    Submit,
    Response(Result<Outcome, DashboardError>),
    Dismiss,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Response(_) => "response",
            Self::Dismiss => "dismiss",
        }
    }
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Success(_) => "success",
            Self::Error(_) => "error",
        }
    }

    pub fn on(self, event: Event) -> Result<Phase, DashboardError> {
        match (self, event) {
            (Self::Idle, Event::Submit) => Ok(Self::Submitting),
            (Self::Submitting, Event::Response(Ok(outcome))) => Ok(Self::Success(outcome)),
            (Self::Submitting, Event::Response(Err(e))) => Ok(Self::Error(e.user_message())),
            (Self::Success(_) | Self::Error(_), Event::Dismiss) => Ok(Self::Idle),
            (from, event) => Err(DashboardError::Transition {
                from: from.name(),
                event: event.name(),
            }),
        }
    }
}

/// Result of one liveness check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub up: bool,
    pub checked_at: DateTime<Utc>,
}

impl Probe {
    pub async fn run(client: &PredictionClient) -> Self {
        let up = match client.probe().await {
            Ok(welcome) => {
                debug!(message = %welcome.message, "prediction service is up");
                true
            }
            Err(e) => {
                warn!(url = %client.base_url(), error = %e, "prediction service is down");
                false
            }
        };
        Self {
            up,
            checked_at: Utc::now(),
        }
    }
}

/// Run one submission from idle to its terminal phase.
///
/// A failed probe ends the submission without any prediction request.
pub async fn submit(
    client: &PredictionClient,
    probe: &Probe,
    input: Result<Input, DashboardError>,
) -> Result<Phase, DashboardError> {
    let phase = Phase::Idle.on(Event::Submit)?;
    let result = match input {
        Ok(input) if probe.up => request(client, input).await,
        Ok(_) => Err(DashboardError::Unavailable),
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        warn!(error = %e, "submission failed");
    }
    phase.on(Event::Response(result))
}

async fn request(client: &PredictionClient, input: Input) -> Result<Outcome, DashboardError> {
    let outcome = match input {
        Input::Iris(measurements) => {
            let label = client.predict_iris(&measurements).await?.prediction;
            Outcome::Species {
                label,
                display: SpeciesDisplay::for_label(label),
            }
        }
        Input::Purchase(profile) => {
            let prediction = client.predict_purchase(&profile).await?;
            Outcome::Purchase {
                label: prediction.prediction,
                probability: prediction.probability,
                outcome: PurchaseOutcome::from_label(prediction.prediction),
            }
        }
    };
    info!(?outcome, "submission succeeded");
    Ok(outcome)
}

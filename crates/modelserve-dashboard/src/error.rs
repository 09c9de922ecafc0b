use std::io;
use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use modelserve_client::ClientError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid form field {field}: {reason}")]
    Form { field: &'static str, reason: String },

    /// The liveness probe failed, so no prediction was requested.
    #[error("prediction service unavailable")]
    Unavailable,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("cannot handle {event} while {from}")]
    Transition {
        from: &'static str,
        event: &'static str,
    },

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("dashboard server error: {0}")]
    Io(#[from] io::Error),
}

impl DashboardError {
    /// Text for the result panel.
    pub fn user_message(&self) -> String {
        match self {
            Self::Form { field, reason } => format!("⚠️ Invalid value for {field}: {reason}"),
            Self::Unavailable => {
                "⚠️ The prediction service is not available. Start it first with `modelserve serve`."
                    .to_string()
            }
            Self::Client(e) if e.is_unreachable() => {
                "🚫 Cannot connect to the prediction service. Check that it is running."
                    .to_string()
            }
            Self::Client(e) => match (e, e.validation()) {
                (_, Some(errors)) => format!(
                    "❌ The service rejected the input: {}",
                    errors
                        .detail
                        .iter()
                        .map(|d| match d.field() {
                            Some(field) => format!("{field}: {}", d.msg),
                            None => d.msg.clone(),
                        })
                        .collect::<Vec<_>>()
                        .join("; ")
                ),
                (ClientError::Server { status, .. }, None) => {
                    format!("❌ API error, status {status}")
                }
                (other, None) => format!("❌ Error: {other}"),
            },
            other => format!("❌ Error: {other}"),
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        error!(error = %self, "dashboard request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Internal Server Error</h1>".to_string()),
        )
            .into_response()
    }
}

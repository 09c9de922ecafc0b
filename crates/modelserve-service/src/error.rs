use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use modelserve_ai::ModelError;
use modelserve_core::{ErrorMessage, ValidationErrors};
use thiserror::Error;
use tracing::{error, warn};

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad input, rejected before the model runs. The client can fix and resubmit.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                warn!(fields = ?errors.fields(), "rejected invalid request");
                (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
            }
            Self::Model(e) => {
                error!(error = %e, "prediction failed");
                internal_error()
            }
            Self::Internal(msg) => {
                error!(error = %msg, "request failed");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorMessage::internal()),
    )
        .into_response()
}

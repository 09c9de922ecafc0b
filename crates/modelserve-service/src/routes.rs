//! HTTP surface: liveness plus the deployment's single prediction endpoint.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use modelserve_ai::Prediction;
use modelserve_core::{
    Deployment, ErrorMessage, IrisPrediction, Location, PurchasePrediction, RawIrisQuery,
    RawPurchaseProfile, ValidationErrors, Welcome,
};
use serde_json::Value;
use tracing::debug;

use crate::context::ServiceContext;
use crate::error::ApiError;

/// Label whose probability the purchase endpoint reports.
const POSITIVE_CLASS: i64 = 1;

/// Build the router for the context's deployment.
pub fn router(ctx: Arc<ServiceContext>) -> Router {
    let predict = match ctx.deployment {
        Deployment::Iris => get(predict_iris),
        Deployment::Purchase => post(predict_purchase),
    };

    Router::new()
        .route("/", get(root))
        .route(ctx.deployment.predict_path(), predict)
        .fallback(not_found)
        .with_state(ctx)
}

async fn root(State(ctx): State<Arc<ServiceContext>>) -> Json<Welcome> {
    Json(Welcome {
        message: ctx.welcome_message().to_string(),
    })
}

async fn predict_iris(
    State(ctx): State<Arc<ServiceContext>>,
    query: Result<Query<RawIrisQuery>, QueryRejection>,
) -> Result<Json<IrisPrediction>, ApiError> {
    let Query(raw) =
        query.map_err(|e| ValidationErrors::unparseable(Location::Query, e.body_text()))?;
    let measurements = raw.validate(Location::Query)?;

    let prediction = run_model(&ctx, measurements.to_features().to_vec()).await?;
    debug!(?measurements, label = prediction.label, "iris prediction");

    Ok(Json(IrisPrediction {
        prediction: prediction.label,
    }))
}

async fn predict_purchase(
    State(ctx): State<Arc<ServiceContext>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PurchasePrediction>, ApiError> {
    let Json(body) =
        body.map_err(|e| ValidationErrors::unparseable(Location::Body, e.body_text()))?;
    let profile = RawPurchaseProfile::from_json(body, Location::Body)?.validate(Location::Body)?;

    let prediction = run_model(&ctx, profile.to_features().to_vec()).await?;
    let probability = ctx
        .model
        .probability_of(&prediction, POSITIVE_CLASS)
        .ok_or_else(|| ApiError::Internal("model does not report class probabilities".into()))?;
    debug!(?profile, label = prediction.label, probability, "purchase prediction");

    Ok(Json(PurchasePrediction::new(prediction.label, probability)))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorMessage::not_found()))
}

/// Run the model on the blocking pool so a slow backend never stalls the executor.
async fn run_model(ctx: &Arc<ServiceContext>, features: Vec<f64>) -> Result<Prediction, ApiError> {
    let ctx = Arc::clone(ctx);
    let prediction = tokio::task::spawn_blocking(move || ctx.model.predict(&features))
        .await
        .map_err(|e| ApiError::Internal(format!("prediction task failed: {e}")))??;
    Ok(prediction)
}

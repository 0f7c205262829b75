use axum::{
    Json,
    body::Bytes,
    extract::{
        State,
        rejection::{BytesRejection, JsonRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    classifier::{ClassifierService, ClassifyError, ModelStatus},
    domain::{Label, Prediction},
};

use super::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifyResponse {
    pub label: Label,
    /// Percentage, two decimals.
    pub confidence: f64,
    pub summary: String,
}

impl From<Prediction> for ClassifyResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            label: prediction.label,
            confidence: prediction.confidence_percent(),
            summary: prediction.summary(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: ModelStatus,
}

pub async fn classify(
    State(service): State<ClassifierService>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| body_rejected(rejection.status(), rejection.body_text()))?;

    let prediction = service
        .classify_email(request.subject.as_deref(), &request.text)
        .map_err(log_rejection)?;

    Ok(Json(prediction.into()))
}

pub async fn classify_file(
    State(service): State<ClassifierService>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let body = body.map_err(|rejection| body_rejected(rejection.status(), rejection.body_text()))?;
    let prediction = service.classify_bytes(&body).map_err(log_rejection)?;
    Ok(Json(prediction.into()))
}

pub async fn health(State(service): State<ClassifierService>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status) = if service.is_ready() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            model: service.status(),
        }),
    )
}

/// The body limit layer answers 413 before a handler sees the input; report it
/// with the same code as an oversized message.
fn body_rejected(status: StatusCode, detail: String) -> ApiError {
    let error = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "input_too_large"
    } else {
        "invalid_request"
    };
    tracing::debug!(target: "http", status = status.as_u16(), error, "request body rejected");
    ApiError {
        status,
        error,
        detail: Some(detail),
    }
}

fn log_rejection(err: ClassifyError) -> ApiError {
    let api = ApiError::from(err);
    tracing::debug!(
        target: "http",
        status = api.status.as_u16(),
        error = api.error,
        "classification request rejected"
    );
    api
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{classifier::ClassifyError, domain::TransformError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<ClassifyError> for ApiError {
    fn from(err: ClassifyError) -> Self {
        match err {
            // the reason was logged at startup; clients only learn the state
            ClassifyError::ArtifactUnavailable { .. } => ApiError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: "model_unavailable",
                detail: None,
            },
            ClassifyError::Transform(err) => {
                let (status, error) = match err {
                    TransformError::EmptyInput => (StatusCode::BAD_REQUEST, "empty_input"),
                    TransformError::InvalidEncoding { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "invalid_encoding")
                    }
                    TransformError::TooLarge { .. } => {
                        (StatusCode::PAYLOAD_TOO_LARGE, "input_too_large")
                    }
                };
                ApiError {
                    status,
                    error,
                    detail: Some(err.to_string()),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_maps_to_503_without_detail() {
        let api: ApiError = ClassifyError::ArtifactUnavailable {
            reason: "file not found".into(),
        }
        .into();
        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            serde_json::to_value(&api).unwrap(),
            serde_json::json!({ "error": "model_unavailable" })
        );
    }

    #[test]
    fn transform_errors_map_to_client_errors() {
        let cases = [
            (TransformError::EmptyInput, StatusCode::BAD_REQUEST, "empty_input"),
            (
                TransformError::InvalidEncoding { valid_up_to: 0 },
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_encoding",
            ),
            (
                TransformError::TooLarge { len: 10, limit: 5 },
                StatusCode::PAYLOAD_TOO_LARGE,
                "input_too_large",
            ),
        ];
        for (err, status, code) in cases {
            let api = ApiError::from(ClassifyError::Transform(err));
            assert_eq!(api.status, status);
            assert_eq!(api.error, code);
            assert!(api.detail.is_some());
        }
    }
}

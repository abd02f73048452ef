use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use slipscan_export::ExportError;
use slipscan_ocr::{OcrError, PipelineError};
use slipscan_storage::StorageError;

/// Error surface of the HTTP handlers. Everything not attributable to the
/// client collapses to an opaque 500; the detail goes to the log, not the
/// response body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    OcrUnavailable,
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::EmptyUpload => ApiError::BadRequest(e.to_string()),
            PipelineError::Ocr(OcrError::Unavailable) => ApiError::OcrUnavailable,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::OcrUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "no OCR engine configured".to_string(),
            ),
            ApiError::Internal(m) => {
                tracing::error!("internal error: {m}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_upload_maps_to_bad_request() {
        let e: ApiError = PipelineError::EmptyUpload.into();
        assert!(matches!(e, ApiError::BadRequest(_)));
    }

    #[test]
    fn missing_engine_maps_to_unavailable() {
        let e: ApiError = PipelineError::Ocr(OcrError::Unavailable).into();
        assert!(matches!(e, ApiError::OcrUnavailable));
    }

    #[test]
    fn engine_failure_maps_to_internal() {
        let e: ApiError = PipelineError::Ocr(OcrError::Engine("boom".into())).into();
        assert!(matches!(e, ApiError::Internal(_)));
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::OcrUnavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

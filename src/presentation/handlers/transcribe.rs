use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::services::TranscriptionServiceError;
use crate::domain::TranscribeRequest;
use crate::presentation::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `POST /transcribe`.
///
/// Caller mistakes map to 400. Every downstream failure maps to 503 with a
/// generic body; the detail is only logged.
pub async fn transcribe_handler(
    State(state): State<AppState>,
    body: Result<Json<TranscribeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Malformed transcription request");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    tracing::info!(
        bucket = %request.bucket,
        file_name = %request.file_name,
        model = ?request.model,
        "Received transcription request"
    );

    match state.transcription_service.transcribe(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(TranscriptionServiceError::InvalidRequest(e)) => {
            tracing::warn!(error = %e, "Rejected transcription request");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                bucket = %request.bucket,
                file_name = %request.file_name,
                "Transcription request failed"
            );
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Transcription service temporarily unavailable".to_string(),
            )
        }
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

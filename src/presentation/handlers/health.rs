use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::domain::WorkerState;
use crate::presentation::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub worker: String,
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let worker = state.worker_state.as_ref().map(|rx| *rx.borrow());

    let (status, health) = match worker {
        None => (StatusCode::OK, "healthy"),
        Some(WorkerState::Running) => (StatusCode::OK, "healthy"),
        Some(_) => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };

    (
        status,
        Json(HealthResponse {
            status: health.to_string(),
            worker: worker
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "disabled".to_string()),
        }),
    )
}

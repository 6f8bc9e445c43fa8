use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "ready to transcribe".to_string(),
    })
}

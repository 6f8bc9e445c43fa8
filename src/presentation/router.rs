use axum::http::header::HeaderName;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::{REQUEST_ID_HEADER, request_id_middleware};
use crate::presentation::handlers::{
    ErrorResponse, health_handler, root_handler, transcribe_handler,
};
use crate::presentation::state::AppState;

/// Routes unknown paths to a JSON 404. Known paths hit with the wrong verb
/// still get axum's 405.
pub fn create_router(state: AppState) -> Router {
    let layers = ServiceBuilder::new()
        .layer(cors_layer())
        .map_response(|res: axum::http::Response<_>| res.map(axum::body::Body::new))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
        .layer(middleware::from_fn(request_id_middleware));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/transcribe", post(transcribe_handler))
        .fallback(not_found)
        .layer(layers)
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not found".to_string(),
        }),
    )
        .into_response()
}

//! Operator endpoint handlers.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::admin::auth;
use crate::http::response::json_error;
use crate::http::server::AppState;

/// `POST /shutdown` — graceful shutdown, gated on the configured bearer key.
/// With no key configured the endpoint is not exposed at all (404), so a
/// default deployment has no reachable shutdown surface.
pub async fn shutdown(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.config.admin.api_key.is_empty() {
        return json_error(StatusCode::NOT_FOUND, "Not Found");
    }
    if !auth::check_bearer(&headers, &state.config.admin.api_key) {
        tracing::warn!("Rejected unauthorized shutdown request");
        return json_error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    tracing::info!("Authorized shutdown request received");
    state.shutdown.trigger();
    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Server shutting down..." })),
    )
        .into_response()
}

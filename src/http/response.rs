//! Response helpers and the security header set.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Security headers applied to every response (setdefault semantics: an
/// origin-provided value wins). `X-XSS-Protection: 0` deliberately disables
/// the legacy browser filter in favor of CSP.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", "default-src 'self'"),
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("referrer-policy", "no-referrer"),
    ("permissions-policy", "geolocation=(), microphone=()"),
    ("x-xss-protection", "0"),
];

/// JSON error body with the given status.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// JSON message body with the given status.
pub fn json_message(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

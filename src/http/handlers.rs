//! Local endpoint handlers.
//!
//! Every handler here sits behind the inspection pipeline; blocked requests
//! never reach them. The pipeline shares its request snapshot through an
//! extension, with a direct body fallback for the pass-through paths that
//! skip inspection.

use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use regex::Regex;
use serde_json::{Map, Value};

use crate::audit::AuditEvent;
use crate::http::request::RequestContext;
use crate::http::response::{json_error, json_message};
use crate::http::server::AppState;
use crate::waf::normalize;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern must compile")
});

/// `GET|POST /` — demo endpoint, always inspected.
pub async fn home() -> Response {
    json_message(StatusCode::OK, "Secure response")
}

/// `GET /health` — liveness probe; bypasses inspection via the route table.
pub async fn health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "operational",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
        .into_response()
}

/// `POST /echo` — reflect the parsed JSON body (null when unparseable).
pub async fn echo(ctx: Option<Extension<Arc<RequestContext>>>, body: Bytes) -> Response {
    let data = match &ctx {
        Some(Extension(ctx)) => ctx.json.clone(),
        None => serde_json::from_slice(&body).ok(),
    }
    .unwrap_or(Value::Null);
    (StatusCode::OK, Json(serde_json::json!({ "echo": data }))).into_response()
}

/// `POST /send-email` — simulated mail submission.
///
/// CRLF is screened on the raw field values, before normalization collapses
/// line breaks into spaces; the recipient shape is checked on the normalized
/// value.
pub async fn send_email(
    State(state): State<AppState>,
    ctx: Option<Extension<Arc<RequestContext>>>,
    body: Bytes,
) -> Response {
    let json = match &ctx {
        Some(Extension(ctx)) => ctx.json.clone(),
        None => serde_json::from_slice(&body).ok(),
    };
    let empty = Map::new();
    let data = json.as_ref().and_then(Value::as_object).unwrap_or(&empty);

    let raw_to = field_string(data, "to");
    let raw_subject = field_string(data, "subject");

    if has_crlf(&raw_to) || has_crlf(&raw_subject) {
        if let Some(Extension(ctx)) = &ctx {
            let payload = normalize::combined_payload(ctx, state.config.waf.max_payload_len);
            let ip = ctx.client_ip.to_string();
            tracing::warn!(client = %ip, "CRLF in email field");
            state.audit.log(&AuditEvent {
                ip: &ip,
                attack: "Email Header Injection (CRLF)",
                pattern: "CRLF_in_field",
                method: ctx.method.as_str(),
                path: &ctx.path,
                user_agent: &ctx.user_agent,
                referer: &ctx.referer,
                payload: &payload,
                request_id: ctx.request_id.as_deref(),
            });
        }
        return json_error(
            StatusCode::FORBIDDEN,
            "Blocked suspicious input (Email Header Injection)",
        );
    }

    let to = normalize::normalize_value(&raw_to, state.config.waf.max_payload_len);
    if !EMAIL_SHAPE.is_match(&to) {
        return json_error(StatusCode::BAD_REQUEST, "Invalid recipient email format");
    }

    json_message(StatusCode::OK, &format!("Email simulated to: {to}"))
}

/// Router-level fallback: unknown path.
pub async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Not Found")
}

/// Method-router fallback for declared routes. A disallowed method is a
/// security event and is audited like one.
pub async fn method_not_allowed(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ctx: Option<Extension<Arc<RequestContext>>>,
    request: Request,
) -> Response {
    let ip = addr.ip().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let payload = ctx
        .as_ref()
        .map(|Extension(ctx)| normalize::combined_payload(ctx, state.config.waf.max_payload_len))
        .unwrap_or_default();

    let header_str = |name: header::HeaderName| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let user_agent = header_str(header::USER_AGENT);
    let referer = header_str(header::REFERER);
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok());

    tracing::warn!(client = %ip, method = %method, path = %path, "Method not allowed");
    state.audit.log(&AuditEvent {
        ip: &ip,
        attack: "Method Not Allowed (405)",
        pattern: "generic",
        method: &method,
        path: &path,
        user_agent: &user_agent,
        referer: &referer,
        payload: &payload,
        request_id,
    });

    json_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

fn field_string(data: &Map<String, Value>, key: &str) -> String {
    match data.get(key) {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn has_crlf(value: &str) -> bool {
    value.contains('\r') || value.contains('\n')
}

//! The request-inspection pipeline.
//!
//! Wraps the whole router as middleware. States, in order: enabled check →
//! IP whitelist → per-route skip marker → allowlist validation (proxy paths
//! exempt) → rate limit → static/binary short-circuit → normalization →
//! dual-pass signature detection → block or dispatch. Any state may end the
//! request with a response; rejections are final for that request.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::audit::AuditEvent;
use crate::http::request::RequestContext;
use crate::http::response::json_error;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::waf::allowlist::Violation;
use crate::waf::{normalize, signatures};

/// Static assets bypass payload inspection.
const STATIC_PREFIX: &str = "/static";

pub async fn inspect(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let ip = addr.ip();

    if !state.config.waf.enabled {
        return dispatch(request, next, &method, start).await;
    }
    if state.whitelist.contains(&ip) {
        tracing::debug!(client = %ip, "Whitelisted client, inspection skipped");
        return dispatch(request, next, &method, start).await;
    }
    if state.routes.skip_detection(&path) {
        return dispatch(request, next, &method, start).await;
    }

    // Inspection needs the body; buffer it, bounded, and restore it below.
    let (mut parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, state.config.waf.max_body_size).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return finish(
                json_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"),
                &method,
                start,
            );
        }
    };
    let ctx = Arc::new(RequestContext::from_parts(&parts, ip, bytes.clone()));
    let ip_str = ip.to_string();
    let max_len = state.config.waf.max_payload_len;

    // Proxy paths are addressed to an external origin with its own parameter
    // contract; the allowlist does not apply to them.
    if !RouteTable::is_proxy_path(&path) {
        if let Err(violation) = state.allowlist.check(
            &path,
            ctx.method.as_str(),
            &ctx.provided_params(),
            ctx.content_type.as_deref(),
        ) {
            let payload = normalize::combined_payload(&ctx, max_len);
            let reason = violation.to_string();
            tracing::warn!(client = %ip, path = %path, reason = %reason, "Allowlist rejection");
            state
                .audit
                .log(&audit_event(&ctx, &ip_str, "AllowListViolation", &reason, &payload));
            metrics::record_allowlist_rejected();
            let response = match violation {
                Violation::ContentType => {
                    json_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Content-Type not allowed")
                }
                _ => json_error(StatusCode::FORBIDDEN, "Request not allowed (allowlist)"),
            };
            return finish(response, &method, start);
        }
    }

    if !state.limiter.allow(ip) {
        tracing::warn!(client = %ip, "Rate limit exceeded");
        state
            .audit
            .log(&audit_event(&ctx, &ip_str, "RateLimit/DDoS", "rate_limit", ""));
        metrics::record_rate_limited();
        return finish(
            json_error(StatusCode::TOO_MANY_REQUESTS, "Too many requests"),
            &method,
            start,
        );
    }

    let is_static = path.starts_with(STATIC_PREFIX)
        || ctx
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"));

    if !is_static {
        let payload = normalize::combined_payload(&ctx, max_len);
        // Two passes over the same pure detector: the raw payload, and an
        // HTML-escaped copy that catches inputs which only turn dangerous
        // after a downstream escaping step.
        let mut matches = signatures::detect(&payload);
        matches.extend(signatures::detect(&normalize::escape_html(&payload)));
        let matches = signatures::dedup_matches(matches);

        if !matches.is_empty() {
            for (category, pattern) in &matches {
                let attack = category.to_string();
                state
                    .audit
                    .log(&audit_event(&ctx, &ip_str, &attack, pattern, &payload));
                metrics::record_blocked(&attack);
            }
            let categories: BTreeSet<String> =
                matches.iter().map(|(c, _)| c.to_string()).collect();
            let joined = categories.into_iter().collect::<Vec<_>>().join(", ");
            tracing::warn!(client = %ip, path = %path, categories = %joined, "Blocked suspicious input");
            return finish(
                json_error(
                    StatusCode::FORBIDDEN,
                    &format!("Blocked suspicious input ({joined})"),
                ),
                &method,
                start,
            );
        }
    }

    parts.extensions.insert(ctx);
    let request = Request::from_parts(parts, Body::from(bytes));
    dispatch(request, next, &method, start).await
}

async fn dispatch(request: Request, next: Next, method: &str, start: Instant) -> Response {
    let response = next.run(request).await;
    metrics::record_request(method, response.status().as_u16(), start);
    response
}

fn finish(response: Response, method: &str, start: Instant) -> Response {
    metrics::record_request(method, response.status().as_u16(), start);
    response
}

fn audit_event<'a>(
    ctx: &'a RequestContext,
    ip: &'a str,
    attack: &'a str,
    pattern: &'a str,
    payload: &'a str,
) -> AuditEvent<'a> {
    AuditEvent {
        ip,
        attack,
        pattern,
        method: ctx.method.as_str(),
        path: &ctx.path,
        user_agent: &ctx.user_agent,
        referer: &ctx.referer,
        payload,
        request_id: ctx.request_id.as_deref(),
    }
}

//! Reverse-proxy forwarding.
//!
//! # Responsibilities
//! - Build the upstream request: origin + suffix path + verbatim query string
//! - Strip hop-by-hop headers both ways; set X-Forwarded-For/Proto/Host
//! - Bound the upstream call with the configured timeout
//! - Map upstream failure classes to 502/504
//!
//! # Design Decisions
//! - Redirects are surfaced to the client, never chased (the legacy client
//!   does not follow them)
//! - No retries here: retry policy belongs to the caller
//! - X-Forwarded-For carries the direct peer address; inbound values are
//!   never trusted

use std::net::IpAddr;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use url::Url;

use crate::http::response::json_error;
use crate::observability::metrics;

/// Connection-level headers that must not cross the proxy in either
/// direction. `Host` is rewritten by the client from the upstream URI.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Assemble the upstream target URL string.
pub fn upstream_target(origin: &Url, suffix: &str, query: Option<&str>) -> String {
    let mut target = origin.as_str().trim_end_matches('/').to_string();
    target.push('/');
    target.push_str(suffix);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Headers for the upstream request: everything except the hop-by-hop set
/// and `Host`, plus the forwarding triplet.
pub fn forwarded_headers(original: &HeaderMap, client_ip: IpAddr) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(original.len() + 3);
    for (name, value) in original {
        if is_hop_by_hop(name) || name == &header::HOST {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Ok(value) = HeaderValue::from_str(&client_ip.to_string()) {
        headers.insert("x-forwarded-for", value);
    }
    headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
    if let Some(host) = original.get(header::HOST) {
        headers.insert("x-forwarded-host", host.clone());
    }

    headers
}

/// Remove hop-by-hop headers from an upstream response before relaying.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Forward a request to its resolved origin and relay the response.
pub async fn forward(
    client: &Client<HttpConnector, Body>,
    origin: &Url,
    suffix: &str,
    parts: &Parts,
    body: Bytes,
    client_ip: IpAddr,
    timeout: Duration,
) -> Response {
    let target = upstream_target(origin, suffix, parts.uri.query());
    let uri: Uri = match target.parse() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(target = %target, error = %e, "Upstream target did not parse");
            metrics::record_upstream("error");
            return json_error(StatusCode::BAD_GATEWAY, "Upstream request failed");
        }
    };

    let mut builder = Request::builder().method(parts.method.clone()).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        *headers = forwarded_headers(&parts.headers, client_ip);
    }
    let request = match builder.body(Body::from(body)) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build upstream request");
            metrics::record_upstream("error");
            return json_error(StatusCode::BAD_GATEWAY, "Upstream request failed");
        }
    };

    match tokio::time::timeout(timeout, client.request(request)).await {
        Err(_) => {
            tracing::warn!(origin = %origin, timeout_secs = timeout.as_secs(), "Upstream timed out");
            metrics::record_upstream("timeout");
            json_error(StatusCode::GATEWAY_TIMEOUT, "Upstream timeout")
        }
        Ok(Err(e)) if e.is_connect() => {
            tracing::warn!(origin = %origin, error = %e, "Upstream unreachable");
            metrics::record_upstream("unreachable");
            json_error(StatusCode::BAD_GATEWAY, "Upstream unreachable")
        }
        Ok(Err(e)) => {
            tracing::error!(origin = %origin, error = %e, "Upstream request failed");
            metrics::record_upstream("error");
            json_error(StatusCode::BAD_GATEWAY, "Upstream request failed")
        }
        Ok(Ok(response)) => {
            let status = response.status();
            tracing::debug!(origin = %origin, status = %status, "Relaying upstream response");
            metrics::record_upstream("relayed");
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body)).into_response()
        }
    }
}

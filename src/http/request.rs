//! Request snapshot construction.
//!
//! # Responsibilities
//! - Capture an immutable per-request view: method, path, client IP, headers,
//!   query pairs, form fields, JSON body, raw bytes
//! - Extract the detection-relevant header values once
//!
//! # Design Decisions
//! - Built once by the pipeline after body buffering and shared with handlers
//!   through request extensions; never persisted
//! - Form parsing covers `application/x-www-form-urlencoded` bodies; JSON
//!   parsing is silent on failure (an unparseable body still reaches
//!   detection through the raw-body token)

use std::collections::HashSet;
use std::net::IpAddr;

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Method};
use serde_json::Value;
use url::form_urlencoded;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Immutable snapshot of one inbound request.
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub client_ip: IpAddr,
    pub headers: HeaderMap,
    /// Decoded query pairs, in order of appearance.
    pub query: Vec<(String, String)>,
    /// Decoded urlencoded form fields, in order of appearance.
    pub form: Vec<(String, String)>,
    /// Parsed JSON body, when the content type says JSON and parsing succeeds.
    pub json: Option<Value>,
    /// Raw body bytes as received.
    pub raw_body: Bytes,
    /// Main content type, lowercased, without parameters.
    pub content_type: Option<String>,
    pub user_agent: String,
    pub referer: String,
    /// Request ID assigned by the request-id middleware.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Build a snapshot from buffered request parts.
    pub fn from_parts(parts: &Parts, client_ip: IpAddr, raw_body: Bytes) -> Self {
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(main_content_type)
            .filter(|ct| !ct.is_empty());

        let query = parts
            .uri
            .query()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let form = if content_type.as_deref() == Some(FORM_CONTENT_TYPE) {
            form_urlencoded::parse(&raw_body).into_owned().collect()
        } else {
            Vec::new()
        };

        let json = if content_type.as_deref() == Some(JSON_CONTENT_TYPE) {
            serde_json::from_slice(&raw_body).ok()
        } else {
            None
        };

        let header_str = |name: header::HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            client_ip,
            user_agent: header_str(header::USER_AGENT),
            referer: header_str(header::REFERER),
            request_id: parts
                .headers
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            headers: parts.headers.clone(),
            query,
            form,
            json,
            raw_body,
            content_type,
        }
    }

    /// Parameter names provided anywhere in the request: query keys, form
    /// keys, and JSON top-level member names.
    pub fn provided_params(&self) -> HashSet<String> {
        let mut params: HashSet<String> = self.query.iter().map(|(k, _)| k.clone()).collect();
        params.extend(self.form.iter().map(|(k, _)| k.clone()));
        if let Some(Value::Object(map)) = &self.json {
            params.extend(map.keys().cloned());
        }
        params
    }
}

/// Main type of a Content-Type header value: parameters stripped, trimmed,
/// lowercased.
pub fn main_content_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

//! Bearer-token check for operator endpoints.

use axum::http::{header, HeaderMap};

/// Whether the request carries `Authorization: Bearer <api_key>`.
/// An empty configured key never authorizes anything.
pub fn check_bearer(headers: &HeaderMap, api_key: &str) -> bool {
    if api_key.is_empty() {
        return false;
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {api_key}"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_matching_token_authorizes() {
        assert!(check_bearer(&headers_with("Bearer secret"), "secret"));
    }

    #[test]
    fn test_wrong_token_rejected() {
        assert!(!check_bearer(&headers_with("Bearer nope"), "secret"));
        assert!(!check_bearer(&headers_with("secret"), "secret"));
        assert!(!check_bearer(&HeaderMap::new(), "secret"));
    }

    #[test]
    fn test_empty_key_never_authorizes() {
        assert!(!check_bearer(&headers_with("Bearer "), ""));
        assert!(!check_bearer(&HeaderMap::new(), ""));
    }
}

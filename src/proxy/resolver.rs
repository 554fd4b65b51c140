//! Proxy token resolution.
//!
//! The token → origin map lives in a shared JSON file that external processes
//! update; it is read and parsed fresh on every call so routing changes take
//! effect without restarting the engine (simplicity over performance, by
//! requirement). Resolution distinguishes a genuinely unknown token from a
//! broken map so config errors stay visible in logs and metrics, even though
//! both answer 404 to the client.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;
use url::Url;

/// Why the map could not answer for a token.
#[derive(Debug, Error)]
pub enum ProxyMapError {
    #[error("failed to read proxy map: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse proxy map: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid origin URL in proxy map: {0}")]
    BadOrigin(url::ParseError),
}

/// Outcome of a token lookup.
#[derive(Debug)]
pub enum Resolution {
    /// Token maps to a valid origin base URL.
    Resolved(Url),
    /// The map is readable and valid but has no entry for the token.
    NotFound,
    /// The map is missing, unreadable, unparseable, or holds a bad URL.
    ConfigError(ProxyMapError),
}

/// Resolve a proxy token against the shared map file.
pub fn resolve(map_path: &Path, token: &str) -> Resolution {
    let content = match fs::read_to_string(map_path) {
        Ok(content) => content,
        Err(e) => return Resolution::ConfigError(e.into()),
    };

    let map: HashMap<String, String> = match serde_json::from_str(&content) {
        Ok(map) => map,
        Err(e) => return Resolution::ConfigError(e.into()),
    };

    match map.get(token) {
        None => Resolution::NotFound,
        Some(origin) => match Url::parse(origin) {
            Ok(url) => Resolution::Resolved(url),
            Err(e) => Resolution::ConfigError(ProxyMapError::BadOrigin(e)),
        },
    }
}

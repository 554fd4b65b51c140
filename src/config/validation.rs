//! Configuration validation.
//!
//! Semantic checks on top of what serde guarantees syntactically: value
//! ranges, parseable addresses, known HTTP methods. All errors are collected
//! and returned together rather than failing on the first.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::config::schema::GatewayConfig;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const KNOWN_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "HEAD",
];

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".to_string(),
            message: format!("not a valid socket address: {}", config.listener.bind_address),
        });
    }

    for ip in &config.waf.whitelist_ips {
        if ip.parse::<IpAddr>().is_err() {
            errors.push(ValidationError {
                field: "waf.whitelist_ips".to_string(),
                message: format!("not a valid IP address: {ip}"),
            });
        }
    }

    if config.waf.rate_limit.max_requests == 0 {
        errors.push(ValidationError {
            field: "waf.rate_limit.max_requests".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.waf.rate_limit.window_secs == 0 {
        errors.push(ValidationError {
            field: "waf.rate_limit.window_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.waf.max_payload_len == 0 {
        errors.push(ValidationError {
            field: "waf.max_payload_len".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if config.proxy.timeout_secs == 0 {
        errors.push(ValidationError {
            field: "proxy.timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.timeouts.request_secs <= config.proxy.timeout_secs {
        errors.push(ValidationError {
            field: "timeouts.request_secs".to_string(),
            message: "must exceed proxy.timeout_secs".to_string(),
        });
    }

    for entry in &config.allowlist {
        if !entry.path.starts_with('/') {
            errors.push(ValidationError {
                field: "allowlist.path".to_string(),
                message: format!("path must start with '/': {}", entry.path),
            });
        }
        for method in &entry.methods {
            if !KNOWN_METHODS.contains(&method.as_str()) {
                errors.push(ValidationError {
                    field: "allowlist.methods".to_string(),
                    message: format!("unknown HTTP method: {method}"),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_bad_bind_address() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.waf.rate_limit.max_requests = 0;
        config.proxy.timeout_secs = 0;
        config.waf.whitelist_ips = vec!["bogus".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn test_unknown_allowlist_method() {
        let mut config = GatewayConfig::default();
        config.allowlist[0].methods.push("FETCH".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("FETCH")));
    }

    #[test]
    fn test_proxy_timeout_must_fit_request_budget() {
        let mut config = GatewayConfig::default();
        config.proxy.timeout_secs = 120;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "timeouts.request_secs"));
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a missing file means a usable configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the WAF gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inspection-engine settings.
    pub waf: WafConfig,

    /// Path allowlist entries.
    pub allowlist: Vec<AllowlistEntryConfig>,

    /// Reverse-proxy settings (map file, timeout).
    pub proxy: ProxyConfig,

    /// Audit log settings.
    pub audit: AuditConfig,

    /// Timeout configuration for the inbound side.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Operator endpoint settings.
    pub admin: AdminConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            waf: WafConfig::default(),
            allowlist: default_allowlist(),
            proxy: ProxyConfig::default(),
            audit: AuditConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Inspection-engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WafConfig {
    /// Master switch; when false every request passes through uninspected.
    pub enabled: bool,

    /// Client IPs exempt from all inspection.
    pub whitelist_ips: Vec<String>,

    /// Sliding-window rate limit.
    pub rate_limit: RateLimitConfig,

    /// Maximum length of a normalized value, in characters.
    pub max_payload_len: usize,

    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,
}

impl Default for WafConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            whitelist_ips: Vec::new(),
            rate_limit: RateLimitConfig::default(),
            max_payload_len: 30_000,
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// Sliding-window rate limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per window per IP.
    pub max_requests: usize,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window_secs: 60,
        }
    }
}

/// One path allowlist entry.
///
/// A path with no entry is allowed unconditionally. `params` and
/// `content_types` left unset mean "no restriction".
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllowlistEntryConfig {
    /// Exact request path this entry governs.
    pub path: String,

    /// Allowed HTTP methods.
    pub methods: Vec<String>,

    /// Allowed parameter names, or unrestricted when absent.
    #[serde(default)]
    pub params: Option<Vec<String>>,

    /// Allowed content types (main type only), or unrestricted when absent.
    #[serde(default)]
    pub content_types: Option<Vec<String>>,
}

/// Default allowlist covering the built-in local endpoints.
pub fn default_allowlist() -> Vec<AllowlistEntryConfig> {
    vec![
        AllowlistEntryConfig {
            path: "/".to_string(),
            methods: vec!["GET".to_string(), "POST".to_string()],
            params: None,
            content_types: None,
        },
        AllowlistEntryConfig {
            path: "/echo".to_string(),
            methods: vec!["POST".to_string()],
            params: None,
            content_types: Some(vec!["application/json".to_string()]),
        },
        AllowlistEntryConfig {
            path: "/send-email".to_string(),
            methods: vec!["POST".to_string()],
            params: Some(vec![
                "to".to_string(),
                "subject".to_string(),
                "body".to_string(),
            ]),
            content_types: Some(vec!["application/json".to_string()]),
        },
    ]
}

/// Reverse-proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Path of the shared token → origin map file (JSON object). Re-read on
    /// every proxy request so external updaters need not signal this process.
    pub map_path: String,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            map_path: "proxy_map.json".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Append-only JSON-lines log file.
    pub log_path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_path: "suspicious.log".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time budget for an inbound request, in seconds. Must exceed the
    /// proxy timeout or upstream timeouts surface as inbound ones.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Operator endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token for the shutdown endpoint. Empty disables the endpoint
    /// entirely (it answers 404).
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert!(config.waf.enabled);
        assert_eq!(config.waf.rate_limit.max_requests, 20);
        assert_eq!(config.waf.rate_limit.window_secs, 60);
        assert_eq!(config.waf.max_payload_len, 30_000);
        assert_eq!(config.proxy.timeout_secs, 30);
        assert!(config.admin.api_key.is_empty());
        assert_eq!(config.allowlist.len(), 3);
    }

    #[test]
    fn test_default_allowlist_entries() {
        let entries = default_allowlist();
        let email = entries.iter().find(|e| e.path == "/send-email").unwrap();
        assert_eq!(email.methods, vec!["POST"]);
        assert_eq!(email.params.as_deref().unwrap(), ["to", "subject", "body"]);
        let root = entries.iter().find(|e| e.path == "/").unwrap();
        assert!(root.params.is_none());
        assert!(root.content_types.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9999"

            [proxy]
            timeout_secs = 5
        "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(config.proxy.timeout_secs, 5);
        assert_eq!(config.waf.rate_limit.max_requests, 20);
    }

    #[test]
    fn test_allowlist_toml_array() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [[allowlist]]
            path = "/api"
            methods = ["GET"]
            params = ["q"]
        "#,
        )
        .unwrap();
        assert_eq!(config.allowlist.len(), 1);
        assert_eq!(config.allowlist[0].path, "/api");
        assert!(config.allowlist[0].content_types.is_none());
    }
}

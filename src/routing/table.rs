//! Per-route metadata table.
//!
//! # Responsibilities
//! - Record, per declared path: allowed methods and whether the inspection
//!   pipeline skips the route
//! - Classify reverse-proxy paths
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - An explicit table consulted by the dispatcher, not runtime introspection
//!   of handler objects
//! - Exact-path lookup; the proxy prefix is the only prefix rule

use std::collections::HashMap;

/// Prefix under which requests are reverse-proxied.
pub const PROXY_PREFIX: &str = "/waf/";

/// Metadata for one declared route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub methods: &'static [&'static str],
    /// When true the pipeline passes the request through uninspected.
    pub skip_detection: bool,
}

/// Route → metadata lookup, immutable for the process lifetime.
#[derive(Debug)]
pub struct RouteTable {
    entries: HashMap<&'static str, RouteEntry>,
}

impl RouteTable {
    /// Table for the built-in local endpoints.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            "/",
            RouteEntry {
                methods: &["GET", "POST"],
                skip_detection: false,
            },
        );
        entries.insert(
            "/echo",
            RouteEntry {
                methods: &["POST"],
                skip_detection: false,
            },
        );
        entries.insert(
            "/send-email",
            RouteEntry {
                methods: &["POST"],
                skip_detection: false,
            },
        );
        entries.insert(
            "/health",
            RouteEntry {
                methods: &["GET"],
                skip_detection: true,
            },
        );
        entries.insert(
            "/shutdown",
            RouteEntry {
                methods: &["POST"],
                skip_detection: true,
            },
        );
        Self { entries }
    }

    pub fn entry(&self, path: &str) -> Option<&RouteEntry> {
        self.entries.get(path)
    }

    /// Whether the pipeline skips inspection for this path.
    pub fn skip_detection(&self, path: &str) -> bool {
        self.entries
            .get(path)
            .map(|e| e.skip_detection)
            .unwrap_or(false)
    }

    /// Whether a path addresses the reverse-proxy surface.
    pub fn is_proxy_path(path: &str) -> bool {
        path.starts_with(PROXY_PREFIX)
    }
}

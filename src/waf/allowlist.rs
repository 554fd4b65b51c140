//! Path allowlist validation.
//!
//! A path with no configured entry is allowed unconditionally (default-open).
//! A configured entry restricts HTTP method membership, content-type
//! membership, and optionally the set of parameter names a request may carry.
//! The pipeline skips this validator entirely for reverse-proxy paths, which
//! are addressed to an external origin with its own parameter contract.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::schema::AllowlistEntryConfig;

/// Why a request failed allowlist validation. The pipeline maps `Method` and
/// `Parameter` to 403 and `ContentType` to 415.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Method,
    ContentType,
    Parameter(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Method => write!(f, "Method not allowed for path"),
            Violation::ContentType => write!(f, "Content-Type not allowed"),
            Violation::Parameter(name) => write!(f, "Parameter '{name}' not allowed"),
        }
    }
}

struct Entry {
    methods: HashSet<String>,
    params: Option<HashSet<String>>,
    content_types: Option<HashSet<String>>,
}

/// Compiled allowlist, immutable after construction.
pub struct Allowlist {
    entries: HashMap<String, Entry>,
}

impl Allowlist {
    pub fn from_config(configs: &[AllowlistEntryConfig]) -> Self {
        let entries = configs
            .iter()
            .map(|c| {
                (
                    c.path.clone(),
                    Entry {
                        methods: c.methods.iter().map(|m| m.to_uppercase()).collect(),
                        params: c
                            .params
                            .as_ref()
                            .map(|p| p.iter().cloned().collect()),
                        content_types: c
                            .content_types
                            .as_ref()
                            .map(|t| t.iter().map(|t| t.to_lowercase()).collect()),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Validate a request against the entry for its path, if any.
    ///
    /// `content_type` is the main type only (no parameters), lowercased by the
    /// caller; the content-type restriction is checked only when both sides
    /// exist. The parameter restriction applies only when the entry declares
    /// an explicit set: every provided name must be a member.
    pub fn check(
        &self,
        path: &str,
        method: &str,
        provided_params: &HashSet<String>,
        content_type: Option<&str>,
    ) -> Result<(), Violation> {
        let Some(entry) = self.entries.get(path) else {
            return Ok(());
        };

        if !entry.methods.contains(method) {
            return Err(Violation::Method);
        }

        if let (Some(allowed), Some(ct)) = (&entry.content_types, content_type) {
            if !allowed.contains(ct) {
                return Err(Violation::ContentType);
            }
        }

        if let Some(allowed) = &entry.params {
            for param in provided_params {
                if !allowed.contains(param) {
                    return Err(Violation::Parameter(param.clone()));
                }
            }
        }

        Ok(())
    }
}

//! Append-only audit log.
//!
//! One JSON object per line. Records carry a bounded snippet plus a SHA-256
//! hash of the full payload, so operators can correlate complete payloads
//! out-of-band without the log holding unbounded sensitive text. Logging is
//! fire-and-forget: I/O failures are swallowed and must never fail or block a
//! request.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Maximum snippet length, in characters.
pub const SNIPPET_LEN: usize = 150;

/// What happened, before snippet/hash derivation.
#[derive(Debug, Clone, Copy)]
pub struct AuditEvent<'a> {
    pub ip: &'a str,
    /// Category or event name ("SQL Injection", "AllowListViolation", ...).
    pub attack: &'a str,
    /// Matched pattern text or rejection reason.
    pub pattern: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    pub user_agent: &'a str,
    pub referer: &'a str,
    /// Full normalized payload; may be empty.
    pub payload: &'a str,
    pub request_id: Option<&'a str>,
}

/// One persisted audit line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub time: String,
    pub ip: String,
    pub attack: String,
    pub pattern: String,
    pub method: String,
    pub path: String,
    pub ua: String,
    pub referer: String,
    pub snippet: String,
    pub payload_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// JSON-lines audit logger.
pub struct AuditLogger {
    path: PathBuf,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Never fails; write errors are traced at debug and
    /// discarded.
    pub fn log(&self, event: &AuditEvent<'_>) {
        let (snippet, payload_hash) = snippet_and_hash(event.payload);
        let record = AuditRecord {
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ip: event.ip.to_string(),
            attack: event.attack.to_string(),
            pattern: event.pattern.to_string(),
            method: event.method.to_string(),
            path: event.path.to_string(),
            ua: event.user_agent.to_string(),
            referer: event.referer.to_string(),
            snippet,
            payload_hash,
            request_id: event.request_id.map(str::to_string),
        };

        if let Err(e) = self.append(&record) {
            tracing::debug!(error = %e, log_path = %self.path.display(), "Audit append failed");
        }
    }

    fn append(&self, record: &AuditRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

/// Derive the 150-char snippet and SHA-256 hex digest of a payload. Both are
/// empty for an empty payload.
pub fn snippet_and_hash(payload: &str) -> (String, String) {
    if payload.is_empty() {
        return (String::new(), String::new());
    }
    let snippet = payload.chars().take(SNIPPET_LEN).collect();
    let hash = hex::encode(Sha256::digest(payload.as_bytes()));
    (snippet, hash)
}

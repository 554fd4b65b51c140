//! Security audit logging subsystem.

pub mod logger;

pub use logger::{snippet_and_hash, AuditEvent, AuditLogger, AuditRecord, SNIPPET_LEN};

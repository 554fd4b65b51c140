//! Request-inspection subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → pipeline.rs (whitelist / route-skip / allowlist / rate limit)
//!     → normalize.rs (decode, fold, collapse → combined payload)
//!     → signatures.rs (dual-pass categorized detection)
//!     → block with 403, or hand off to routing
//! ```
//!
//! # Design Decisions
//! - Fail closed on any signature match; a single hit blocks
//! - The detector is a pure function; input transforms happen in the pipeline
//! - Normalization never fails a request

pub mod allowlist;
pub mod normalize;
pub mod pipeline;
pub mod rate_limit;
pub mod signatures;

pub use allowlist::Allowlist;
pub use rate_limit::RateLimiter;
pub use signatures::{detect, AttackCategory};

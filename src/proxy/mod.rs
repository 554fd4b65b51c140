//! Reverse-proxy subsystem.
//!
//! # Data Flow
//! ```text
//! /waf/{token}/{path...}
//!     → resolver.rs (fresh map-file read, token → origin | not-found | config error)
//!     → forwarder.rs (header hygiene, X-Forwarded-*, bounded upstream call)
//!     → upstream response relayed, hop-by-hop headers stripped
//! ```

pub mod forwarder;
pub mod resolver;

pub use resolver::{resolve, ProxyMapError, Resolution};

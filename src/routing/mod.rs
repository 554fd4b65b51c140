//! Route metadata subsystem.
//!
//! The axum router owns URL dispatch; this module owns the per-route
//! metadata the pipeline and fallbacks consult (method sets, detection-skip
//! markers, proxy-path classification).

pub mod table;

pub use table::{RouteEntry, RouteTable, PROXY_PREFIX};

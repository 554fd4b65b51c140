//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware stack)
//!     → waf pipeline (inspection; see crate::waf)
//!     → handlers.rs (local endpoints) or proxy dispatch
//!     → response.rs (security headers, JSON bodies)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::RequestContext;
pub use server::{AppState, GatewayServer};

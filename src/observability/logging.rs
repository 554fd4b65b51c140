//! Structured logging.
//!
//! Uses the tracing stack; the level comes from config (the `WAF_DEBUG`
//! environment flag forces `debug` upstream in the loader) and `RUST_LOG`
//! wins when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber. Call once, from `main`.
pub fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!("waf_gateway={level},tower_http=info"))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

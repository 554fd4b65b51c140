//! WAF Gateway Library
//!
//! A request-inspection gateway built with Tokio and Axum: it normalizes
//! inbound HTTP traffic, runs categorized attack-signature detection,
//! enforces a sliding-window rate limit and a path allowlist, and forwards
//! clean traffic to token-resolved origin servers.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────────┐
//!                    │                   WAF GATEWAY                      │
//!                    │                                                    │
//!   Client Request   │  ┌─────────┐   ┌──────────────────────────────┐   │
//!   ─────────────────┼─▶│  http   │──▶│         waf pipeline         │   │
//!                    │  │ server  │   │ whitelist → allowlist → rate │   │
//!                    │  └─────────┘   │ limit → normalize → detect   │   │
//!                    │                └──────┬────────────────┬──────┘   │
//!                    │                       │ blocked        │ clean    │
//!                    │                       ▼                ▼          │
//!                    │                ┌───────────┐   ┌──────────────┐   │
//!                    │                │   audit   │   │ local handler│   │
//!                    │                │  logger   │   │ or proxy     │───┼──▶ Origin
//!                    │                └───────────┘   │ resolve+fwd  │   │    Server
//!                    │                                └──────────────┘   │
//!                    │                                                   │
//!                    │  ┌─────────────────────────────────────────────┐  │
//!                    │  │            Cross-Cutting Concerns           │  │
//!                    │  │  config · routing table · observability ·   │  │
//!                    │  │  lifecycle · admin                          │  │
//!                    │  └─────────────────────────────────────────────┘  │
//!                    └───────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;
pub mod waf;

// Traffic egress
pub mod proxy;

// Cross-cutting concerns
pub mod admin;
pub mod audit;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;

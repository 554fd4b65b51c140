//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router with all local and proxy routes
//! - Wire up middleware (inspection pipeline, security headers, tracing,
//!   request ID, timeouts, body limits)
//! - Dispatch proxy requests: token resolution, then forwarding
//! - Serve with graceful shutdown

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{ConnectInfo, DefaultBodyLimit, Path as RoutePath, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::Response;
use axum::routing::{any, get, post};
use axum::Router;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::audit::AuditLogger;
use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::response::{json_error, SECURITY_HEADERS};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::proxy::{forwarder, resolver, Resolution};
use crate::routing::RouteTable;
use crate::waf::{pipeline, Allowlist, RateLimiter};

/// Application state injected into handlers and the pipeline.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub whitelist: Arc<HashSet<IpAddr>>,
    pub allowlist: Arc<Allowlist>,
    pub routes: Arc<RouteTable>,
    pub limiter: Arc<RateLimiter>,
    pub audit: Arc<AuditLogger>,
    pub client: Client<HttpConnector, Body>,
    pub shutdown: Arc<Shutdown>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    shutdown: Arc<Shutdown>,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let config = Arc::new(config);
        // Unparseable whitelist entries were already reported by validation.
        let whitelist: HashSet<IpAddr> = config
            .waf
            .whitelist_ips
            .iter()
            .filter_map(|ip| ip.parse().ok())
            .collect();
        let shutdown = Arc::new(Shutdown::new());
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            whitelist: Arc::new(whitelist),
            allowlist: Arc::new(Allowlist::from_config(&config.allowlist)),
            routes: Arc::new(RouteTable::builtin()),
            limiter: Arc::new(RateLimiter::from_config(&config.waf.rate_limit)),
            audit: Arc::new(AuditLogger::new(config.audit.log_path.clone())),
            client,
            shutdown: shutdown.clone(),
            config: config.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, shutdown }
    }

    /// Handle for triggering shutdown from outside the server.
    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }

    /// Build the axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route(
                "/",
                get(handlers::home)
                    .post(handlers::home)
                    .fallback(handlers::method_not_allowed),
            )
            .route(
                "/echo",
                post(handlers::echo).fallback(handlers::method_not_allowed),
            )
            .route(
                "/send-email",
                post(handlers::send_email).fallback(handlers::method_not_allowed),
            )
            .route(
                "/health",
                get(handlers::health).fallback(handlers::method_not_allowed),
            )
            .route(
                "/shutdown",
                post(admin::handlers::shutdown).fallback(handlers::method_not_allowed),
            )
            .route("/waf/{token}", any(proxy_root))
            .route("/waf/{token}/{*path}", any(proxy_subpath))
            .fallback(handlers::not_found)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    )))
                    .layer(DefaultBodyLimit::max(config.waf.max_body_size))
                    .layer(middleware::from_fn_with_state(
                        state.clone(),
                        pipeline::inspect,
                    )),
            );

        // Outermost: security headers on every response, including pipeline
        // rejections and timeouts. `if_not_present` keeps origin-set values.
        for (name, value) in SECURITY_HEADERS {
            router = router.layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            ));
        }

        router.with_state(state)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(self.shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `/waf/{token}` — forward to the origin root.
async fn proxy_root(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    RoutePath(token): RoutePath<String>,
    request: Request,
) -> Response {
    proxy_dispatch(state, addr.ip(), token, String::new(), request).await
}

/// `/waf/{token}/{path...}` — forward to a path under the origin.
async fn proxy_subpath(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    RoutePath((token, path)): RoutePath<(String, String)>,
    request: Request,
) -> Response {
    proxy_dispatch(state, addr.ip(), token, path, request).await
}

/// Resolve the token and forward. An unknown token and a broken map both
/// answer 404; the latter is additionally traced and counted so operators can
/// tell them apart.
async fn proxy_dispatch(
    state: AppState,
    client_ip: IpAddr,
    token: String,
    suffix: String,
    request: Request,
) -> Response {
    match resolver::resolve(Path::new(&state.config.proxy.map_path), &token) {
        Resolution::NotFound => {
            tracing::warn!(token = %token, "Unknown proxy token");
            json_error(StatusCode::NOT_FOUND, "Unknown proxy token")
        }
        Resolution::ConfigError(e) => {
            tracing::error!(
                error = %e,
                map_path = %state.config.proxy.map_path,
                "Proxy map unavailable"
            );
            metrics::record_map_error();
            json_error(StatusCode::NOT_FOUND, "Unknown proxy token")
        }
        Resolution::Resolved(origin) => {
            let (parts, body) = request.into_parts();
            let bytes = match axum::body::to_bytes(body, state.config.waf.max_body_size).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    return json_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                }
            };
            forwarder::forward(
                &state.client,
                &origin,
                &suffix,
                &parts,
                bytes,
                client_ip,
                Duration::from_secs(state.config.proxy.timeout_secs),
            )
            .await
        }
    }
}

/// Wait for Ctrl-C or an authorized shutdown request.
async fn shutdown_signal(shutdown: Arc<Shutdown>) {
    let mut rx = shutdown.subscribe();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if result.is_ok() {
                tracing::info!("Shutdown signal received");
            }
        }
        _ = rx.recv() => {
            tracing::info!("Shutdown requested via operator endpoint");
        }
    }
}

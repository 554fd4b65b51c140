use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use waf_gateway::config::{default_config, load_config};
use waf_gateway::observability::{logging, metrics};
use waf_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "waf-gateway")]
#[command(about = "Request-inspection gateway with reverse-proxy forwarding", long_about = None)]
struct Args {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address (e.g. 127.0.0.1:8080).
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };
    if let Some(listen) = args.listen {
        config.listener.bind_address = listen;
    }

    logging::init_tracing(&config.observability.log_level);

    tracing::info!("waf-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit = config.waf.rate_limit.max_requests,
        rate_window_secs = config.waf.rate_limit.window_secs,
        proxy_map = %config.proxy.map_path,
        audit_log = %config.audit.log_path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = GatewayServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

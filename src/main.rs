//! dockgate
//!
//! Docker Engine API proxy with per-resource access control.

use clap::Parser;
use dockgate::{
    access_control::StaticResourceControlStore,
    auth::create_authenticator,
    config::{LogFormat, LoggingConfig, load_config},
    docker::ListFilterOptions,
    metrics::ProxyMetrics,
    proxy::{ProxyConfig, ProxyState, RouteTable, run_proxy},
    upstream::DockerClient,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// dockgate - Per-resource access control for the Docker Engine API
#[derive(Parser, Debug)]
#[command(name = "dockgate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "DOCKGATE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "DOCKGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Proxy listen host; overrides the config file
    #[arg(long, env = "DOCKGATE_HOST")]
    host: Option<String>,

    /// Proxy listen port; overrides the config file
    #[arg(long, env = "DOCKGATE_PORT")]
    port: Option<u16>,
}

fn init_logging(logging: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = match logging.format {
        LogFormat::Pretty => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logging is configured by the file, so it starts after loading it
    let config = load_config(args.config.as_deref())?;
    init_logging(&config.logging, args.log_level.as_deref());

    info!(version = env!("CARGO_PKG_VERSION"), "Starting dockgate");

    let authenticator = create_authenticator(&config)
        .inspect_err(|e| error!(error = %e, "Failed to create authenticator"))?;

    let store = StaticResourceControlStore::from_config(&config.resource_controls)
        .inspect_err(|e| error!(error = %e, "Failed to load resource controls"))?;
    info!(
        resource_controls = store.len(),
        users = config.users.len(),
        "Access control loaded"
    );

    let docker = DockerClient::new(&config.upstream)
        .inspect_err(|e| error!(error = %e, "Failed to create Docker client"))?;
    info!(upstream = %config.upstream.base_url(), "Forwarding to Docker daemon");

    let state = ProxyState {
        docker: Arc::new(docker),
        authenticator,
        store: Arc::new(store),
        routes: Arc::new(RouteTable::new()?),
        metrics: Arc::new(ProxyMetrics::new()),
        list_options: ListFilterOptions::from(&config.filtering),
        max_body_bytes: config.server.max_body_bytes,
    };

    let host = args.host.as_deref().unwrap_or(&config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let proxy_config = ProxyConfig::from_host_port(host, port)?;

    run_proxy(proxy_config, state).await
}

//! Proxy HTTP server
//!
//! Every inbound request is authenticated and forwarded to the Docker
//! daemon. Successful answers on the container list and inspect routes go
//! through the container filters; everything else is returned as is.

use crate::access_control::{Identity, OperationContext, ResourceControlStore};
use crate::auth::Authenticator;
use crate::docker::{
    FilterOutcome, ListFilterOptions, container_inspect_operation, container_list_operation,
};
use crate::error::{AppError, AuthError};
use crate::metrics::{MetricsSnapshot, ProxyMetrics};
use crate::proxy::DEFAULT_PROXY_PORT;
use crate::proxy::response::passthrough;
use crate::proxy::routes::{Route, RouteTable};
use crate::upstream::{DockerClient, UpstreamResponse};
use axum::{
    Json, Router,
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Path of the metrics endpoint. Never forwarded upstream.
pub const METRICS_PATH: &str = "/_dockgate/metrics";

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address to bind to (e.g., "127.0.0.1:23750")
    pub bind: SocketAddr,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PROXY_PORT)),
        }
    }
}

impl ProxyConfig {
    /// Create config from host and port
    pub fn from_host_port(host: &str, port: u16) -> Result<Self, std::net::AddrParseError> {
        let bind: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self { bind })
    }
}

/// Shared state for proxy handlers
#[derive(Clone)]
pub struct ProxyState {
    pub docker: Arc<DockerClient>,
    pub authenticator: Arc<dyn Authenticator>,
    pub store: Arc<dyn ResourceControlStore>,
    pub routes: Arc<RouteTable>,
    pub metrics: Arc<ProxyMetrics>,
    pub list_options: ListFilterOptions,
    pub max_body_bytes: usize,
}

impl ProxyState {
    /// Snapshot the resource controls for one request
    async fn operation_context(&self, identity: &Identity) -> Result<OperationContext, AppError> {
        let resource_controls = self.store.resource_controls().await?;
        Ok(OperationContext::new(identity, resource_controls))
    }
}

/// A handled request and the filter decision behind it
struct Handled {
    response: Response,
    outcome: Option<FilterOutcome>,
}

impl Handled {
    fn passthrough(upstream: UpstreamResponse) -> Self {
        Self {
            response: passthrough(upstream),
            outcome: None,
        }
    }
}

/// Build the proxy router
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(METRICS_PATH, get(metrics_handler))
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the proxy until Ctrl+C
pub async fn run_proxy(config: ProxyConfig, state: ProxyState) -> anyhow::Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(config.bind).await?;
    info!("Proxy listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
            }
        })
        .await?;

    info!("Proxy stopped");
    Ok(())
}

async fn metrics_handler(
    State(state): State<ProxyState>,
    headers: HeaderMap,
) -> Result<Json<MetricsSnapshot>, AppError> {
    let identity = state.authenticator.authenticate(&headers).await?;
    if !identity.is_admin {
        return Err(AuthError::AdminRequired.into());
    }
    Ok(Json(state.metrics.snapshot()))
}

async fn proxy_handler(State(state): State<ProxyState>, request: Request) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let route = state.routes.classify(&parts.method, parts.uri.path());

    let identity = match state.authenticator.authenticate(&parts.headers).await {
        Ok(identity) => identity,
        Err(e) => {
            let error = e.to_string();
            state.metrics.record_request(
                route.name(),
                None,
                started.elapsed(),
                None,
                Some(error.as_str()),
            );
            return AppError::from(e).into_response();
        }
    };

    match forward(&state, &route, &identity, parts, body).await {
        Ok(handled) => {
            state.metrics.record_request(
                route.name(),
                Some(identity.user_id),
                started.elapsed(),
                handled.outcome.as_ref(),
                None,
            );
            handled.response
        }
        Err(e) => {
            let error = e.to_string();
            state.metrics.record_request(
                route.name(),
                Some(identity.user_id),
                started.elapsed(),
                None,
                Some(error.as_str()),
            );
            e.into_response()
        }
    }
}

/// Forward a request upstream and filter the answer when the route asks for it
async fn forward(
    state: &ProxyState,
    route: &Route,
    identity: &Identity,
    parts: Parts,
    body: Body,
) -> Result<Handled, AppError> {
    let body = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| AppError::RequestBody(e.to_string()))?;
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let upstream = state
        .docker
        .forward(parts.method, path_and_query, &parts.headers, body)
        .await?;

    // only successful answers have the documented payload shape; redirects
    // are never followed upstream and reach the client as they are
    if upstream.status != StatusCode::OK {
        return Ok(Handled::passthrough(upstream));
    }

    let output = match route {
        Route::Passthrough => return Ok(Handled::passthrough(upstream)),
        Route::ContainerList => {
            let ctx = state.operation_context(identity).await?;
            container_list_operation(upstream, &ctx, state.list_options)?
        }
        Route::ContainerInspect { container } => {
            debug!(container = %container, "Guarding container inspection");
            let ctx = state.operation_context(identity).await?;
            container_inspect_operation(upstream, &ctx)?
        }
    };

    info!(
        route = route.name(),
        user_id = %identity.user_id,
        decision = output.outcome.label(),
        "Filtered container response"
    );

    Ok(Handled {
        response: output.response,
        outcome: Some(output.outcome),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_config_from_host_port() {
        let config = ProxyConfig::from_host_port("0.0.0.0", 2376).unwrap();
        assert_eq!(config.bind.port(), 2376);
        assert!(ProxyConfig::from_host_port("not a host", 1).is_err());
    }

    #[test]
    fn test_default_proxy_config() {
        assert_eq!(ProxyConfig::default().bind.port(), DEFAULT_PROXY_PORT);
    }
}

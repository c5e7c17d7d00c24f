//! Filtering reverse proxy for the Docker Engine API

pub mod response;
pub mod routes;
pub mod server;

pub use response::{
    ACCESS_DENIED_MESSAGE, passthrough, response_as_json_array, response_as_json_object,
    rewrite_access_denied_response, rewrite_response,
};
pub use routes::{Route, RouteTable};
pub use server::{METRICS_PATH, ProxyConfig, ProxyState, router, run_proxy};

/// Default port of the proxy listener
pub const DEFAULT_PROXY_PORT: u16 = 23750;

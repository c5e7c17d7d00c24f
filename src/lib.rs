//! dockgate
//!
//! A reverse proxy for the Docker Engine API that applies per-resource
//! access control to container responses.
//!
//! ## Features
//!
//! - **List filtering**: non-admin users only see the containers they may
//!   access in `GET /containers/json`
//! - **Inspect guard**: `GET /containers/{id}/json` is denied when the
//!   container, or the swarm service that created it, is off limits
//! - **Decoration**: visible resources carry their resource control under
//!   a `Dockgate` field, so clients can show ownership without a lookup
//! - **Flexible configuration** via TOML files and environment variables
//!
//! ## Example Configuration
//!
//! ```toml
//! [upstream]
//! url = "http://127.0.0.1:2375"   # or DOCKER_HOST=tcp://127.0.0.1:2375
//!
//! [[users]]
//! id = 1
//! token = "admin-token"
//! admin = true
//!
//! [[users]]
//! id = 2
//! token = "dev-token"
//! teams = [10]
//!
//! [[resource_controls]]
//! resource_id = "4a2f0c9e1b7d"
//! teams = [10]
//! ```

pub mod access_control;
pub mod auth;
pub mod config;
pub mod docker;
pub mod error;
pub mod metrics;
pub mod proxy;
pub mod upstream;

// Re-export main types
pub use access_control::{OperationContext, ResourceControl};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use metrics::ProxyMetrics;
pub use proxy::{ProxyConfig, ProxyState};

//! Configuration types for dockgate
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::access_control::{ResourceControl, ResourceType, TeamId, UserId};
use crate::auth::Token;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upstream Docker Engine API settings
    pub upstream: UpstreamConfig,

    /// Proxy listener settings
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Response filtering behaviour
    pub filtering: FilteringConfig,

    /// Users allowed to talk to the proxy
    pub users: Vec<UserConfig>,

    /// Resource controls served by the static store
    pub resource_controls: Vec<ResourceControlConfig>,
}

/// Upstream Docker Engine API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Docker Engine API URL (e.g., `http://127.0.0.1:2375`)
    pub url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries for failed idempotent requests
    pub max_retries: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:2375".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

impl UpstreamConfig {
    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Proxy listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Largest request body forwarded upstream, in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: crate::proxy::DEFAULT_PROXY_PORT,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Response filtering configuration
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct FilteringConfig {
    /// Apply swarm service resource controls to container lists as well as
    /// to container inspection
    pub list_service_inheritance: bool,
}

/// A proxy user and the bearer token identifying them
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub id: UserId,

    #[serde(default)]
    pub name: Option<String>,

    pub token: Token,

    #[serde(default)]
    pub admin: bool,

    #[serde(default)]
    pub teams: Vec<TeamId>,
}

/// A resource control as written in the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceControlConfig {
    /// Record id; defaults to the 1-based position in the list
    #[serde(default)]
    pub id: Option<u32>,

    /// Docker identifier of the protected container or service
    pub resource_id: String,

    #[serde(default, rename = "type")]
    pub resource_type: ResourceType,

    #[serde(default)]
    pub administrators_only: bool,

    #[serde(default)]
    pub public: bool,

    /// Authorized user ids
    #[serde(default)]
    pub users: Vec<UserId>,

    /// Authorized team ids
    #[serde(default)]
    pub teams: Vec<TeamId>,
}

impl ResourceControlConfig {
    /// Convert into a resource control, using `fallback_id` when no id is set
    pub fn to_resource_control(&self, fallback_id: u32) -> ResourceControl {
        let mut rc = ResourceControl::new(
            self.id.unwrap_or(fallback_id),
            self.resource_id.clone(),
            self.resource_type,
        );
        rc.administrators_only = self.administrators_only;
        rc.public = self.public;
        for user in &self.users {
            rc = rc.with_user(*user);
        }
        for team in &self.teams {
            rc = rc.with_team(*team);
        }
        rc
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

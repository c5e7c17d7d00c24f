//! Error types for dockgate
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API,
//! and convert to HTTP responses at the proxy boundary (see [`http_mapper`]).
//!
//! An authorization failure is absent from this hierarchy: a
//! denied resource is a normal outcome of the response filters, rendered as
//! a 403 response, never an error value.

pub mod http_mapper;

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Response filtering error: {0}")]
    Filter(#[from] FilterError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Resource control store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to read request body: {0}")]
    RequestBody(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Duplicate resource control for resource '{resource_id}'")]
    DuplicateResourceControl { resource_id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding, filtering or re-encoding an upstream payload.
///
/// These are schema violations: the upstream answered with something that
/// does not match the documented Docker Engine API shape.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Docker container identifier not found")]
    ContainerIdentifierNotFound,

    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Upstream Docker API errors
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request to upstream failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("Upstream request timeout after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No credentials provided")]
    MissingCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Administrator privileges required")]
    AdminRequired,
}

/// Resource control store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Resource control store unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for response filtering
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Result type alias for upstream Docker API operations
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

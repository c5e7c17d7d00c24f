//! Upstream Docker daemon access

pub mod client;

pub use client::{DockerClient, UpstreamResponse, forwarded_headers};

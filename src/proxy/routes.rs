//! Route dispatch
//!
//! Decides which inbound requests go through a response filter. Only the two
//! container read endpoints are filtered, with or without an API version
//! prefix (`/v1.41/containers/json`); everything else is proxied untouched.
//!
//! The version segment uses the daemon's own grammar (`v[0-9.]+`), so every
//! path the daemon routes to a container endpoint is classified as one.

use axum::http::Method;
use regex::Regex;

/// How the proxy treats a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /containers/json`
    ContainerList,
    /// `GET /containers/{id}/json`
    ContainerInspect { container: String },
    /// Forwarded without filtering
    Passthrough,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::ContainerList => "container_list",
            Route::ContainerInspect { .. } => "container_inspect",
            Route::Passthrough => "passthrough",
        }
    }
}

/// Compiled route patterns
#[derive(Debug, Clone)]
pub struct RouteTable {
    versioned: Regex,
    container_list: Regex,
    container_inspect: Regex,
}

impl RouteTable {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            versioned: Regex::new(r"^/v[0-9.]+(/.*)$")?,
            container_list: Regex::new(r"^/containers/json/?$")?,
            container_inspect: Regex::new(r"^/containers/([^/]+)/json/?$")?,
        })
    }

    /// The path with its API version segment removed
    fn api_path<'a>(&self, path: &'a str) -> &'a str {
        self.versioned
            .captures(path)
            .and_then(|captures| captures.get(1))
            .map_or(path, |rest| rest.as_str())
    }

    /// Classify a request by method and path (without query string)
    pub fn classify(&self, method: &Method, path: &str) -> Route {
        if *method != Method::GET {
            return Route::Passthrough;
        }

        let path = self.api_path(path);
        if self.container_list.is_match(path) {
            return Route::ContainerList;
        }

        match self.container_inspect.captures(path) {
            Some(captures) => Route::ContainerInspect {
                container: captures[1].to_string(),
            },
            None => Route::Passthrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new().unwrap()
    }

    #[test]
    fn test_container_list() {
        let table = table();
        assert_eq!(
            table.classify(&Method::GET, "/containers/json"),
            Route::ContainerList
        );
        assert_eq!(
            table.classify(&Method::GET, "/v1.41/containers/json"),
            Route::ContainerList
        );
        assert_eq!(
            table.classify(&Method::GET, "/v1/containers/json/"),
            Route::ContainerList
        );
    }

    #[test]
    fn test_any_daemon_version_segment() {
        let table = table();
        assert_eq!(
            table.classify(&Method::GET, "/v1.41.0/containers/json"),
            Route::ContainerList
        );
        assert_eq!(
            table.classify(&Method::GET, "/v1.41.0/containers/c1/json"),
            Route::ContainerInspect {
                container: "c1".to_string()
            }
        );
        assert_eq!(
            table.classify(&Method::GET, "/v.1/containers/json"),
            Route::ContainerList
        );
    }

    #[test]
    fn test_container_inspect() {
        assert_eq!(
            table().classify(&Method::GET, "/v1.43/containers/4a2f0c9e/json"),
            Route::ContainerInspect {
                container: "4a2f0c9e".to_string()
            }
        );
    }

    #[test]
    fn test_list_is_not_an_inspect_of_json() {
        // "json" is never captured as a container name
        assert_eq!(
            table().classify(&Method::GET, "/containers/json"),
            Route::ContainerList
        );
    }

    #[test]
    fn test_passthrough() {
        let table = table();
        assert_eq!(
            table.classify(&Method::POST, "/containers/json"),
            Route::Passthrough
        );
        assert_eq!(
            table.classify(&Method::GET, "/containers/c1/logs"),
            Route::Passthrough
        );
        assert_eq!(table.classify(&Method::GET, "/images/json"), Route::Passthrough);
        assert_eq!(
            table.classify(&Method::GET, "/vx/containers/json"),
            Route::Passthrough
        );
        assert_eq!(table.classify(&Method::GET, "/_ping"), Route::Passthrough);
    }

    #[test]
    fn test_route_names() {
        assert_eq!(Route::ContainerList.name(), "container_list");
        assert_eq!(Route::Passthrough.name(), "passthrough");
    }
}

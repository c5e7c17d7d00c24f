//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. `DOCKER_HOST` (tcp:// and http(s):// endpoints only)
//! 2. Environment variables (DOCKGATE__*)
//! 3. Configuration file (TOML)
//! 4. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "dockgate.toml",
    ".dockgate.toml",
    "~/.config/dockgate/config.toml",
    "/etc/dockgate/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g., DOCKGATE__UPSTREAM__URL, DOCKGATE__SERVER__PORT
    builder = builder.add_source(
        Environment::with_prefix("DOCKGATE")
            .separator("__")
            .try_parsing(true),
    );

    if let Ok(docker_host) = std::env::var("DOCKER_HOST") {
        match upstream_url_from_docker_host(&docker_host) {
            Some(url) => {
                builder = builder
                    .set_override("upstream.url", url)
                    .map_err(|e| ConfigError::Load(e.to_string()))?;
            }
            None => warn!(
                docker_host = %docker_host,
                "Ignoring DOCKER_HOST, only tcp:// and http(s):// endpoints are supported"
            ),
        }
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Translate a Docker CLI style `DOCKER_HOST` into an HTTP base URL.
///
/// Returns `None` for transports the proxy cannot speak (unix sockets, ssh).
pub fn upstream_url_from_docker_host(docker_host: &str) -> Option<String> {
    let docker_host = docker_host.trim();
    if let Some(rest) = docker_host.strip_prefix("tcp://") {
        return (!rest.is_empty()).then(|| format!("http://{}", rest));
    }
    if docker_host.starts_with("http://") || docker_host.starts_with("https://") {
        return Some(docker_host.to_string());
    }
    None
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.upstream.url.is_empty() {
        return Err(ConfigError::Missing {
            field: "upstream.url".to_string(),
        });
    }

    if !config.upstream.url.starts_with("http://") && !config.upstream.url.starts_with("https://")
    {
        return Err(ConfigError::Invalid {
            message: format!(
                "upstream.url must start with http:// or https://, got: {}",
                config.upstream.url
            ),
        });
    }

    if config.upstream.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "upstream.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    validate_users(config)?;
    validate_resource_controls(config)?;

    Ok(())
}

/// User ids and tokens must be unique and tokens non-empty
fn validate_users(config: &AppConfig) -> Result<(), ConfigError> {
    let mut ids = HashSet::new();
    let mut tokens = HashSet::new();

    for user in &config.users {
        if user.token.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("users[{}].token must not be empty", user.id),
            });
        }
        if !ids.insert(user.id) {
            return Err(ConfigError::Invalid {
                message: format!("duplicate user id {}", user.id),
            });
        }
        if !tokens.insert(user.token.expose_secret()) {
            return Err(ConfigError::Invalid {
                message: format!("users[{}].token is shared with another user", user.id),
            });
        }
    }

    Ok(())
}

/// At most one resource control per resource identifier
fn validate_resource_controls(config: &AppConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for rc in &config.resource_controls {
        if rc.resource_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "resource_controls.resource_id".to_string(),
            });
        }
        if !seen.insert(rc.resource_id.as_str()) {
            return Err(ConfigError::DuplicateResourceControl {
                resource_id: rc.resource_id.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
[upstream]
url = "http://docker.example.com:2375"

[server]
port = 9000
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.upstream.url, "http://docker.example.com:2375");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_invalid_url_error() {
        let toml = r#"
[upstream]
url = "unix:///var/run/docker.sock"
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_empty_url_error() {
        let toml = r#"
[upstream]
url = ""
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_zero_timeout_error() {
        let toml = r#"
[upstream]
timeout_secs = 0
"#;

        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn test_duplicate_resource_control() {
        let toml = r#"
[[resource_controls]]
resource_id = "c1"
users = [1]

[[resource_controls]]
resource_id = "c1"
teams = [2]
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateResourceControl { .. })
        ));
    }

    #[test]
    fn test_duplicate_user_id() {
        let toml = r#"
[[users]]
id = 1
token = "a"

[[users]]
id = 1
token = "b"
"#;

        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_shared_token() {
        let toml = r#"
[[users]]
id = 1
token = "same"

[[users]]
id = 2
token = "same"
"#;

        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_upstream_url_from_docker_host() {
        assert_eq!(
            upstream_url_from_docker_host("tcp://10.0.0.5:2375"),
            Some("http://10.0.0.5:2375".to_string())
        );
        assert_eq!(
            upstream_url_from_docker_host("https://docker.example.com"),
            Some("https://docker.example.com".to_string())
        );
        assert_eq!(
            upstream_url_from_docker_host("unix:///var/run/docker.sock"),
            None
        );
        assert_eq!(upstream_url_from_docker_host("tcp://"), None);
        assert_eq!(upstream_url_from_docker_host("ssh://me@host"), None);
    }
}

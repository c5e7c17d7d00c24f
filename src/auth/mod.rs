//! Authentication module
//!
//! Establishes who is calling the proxy. Currently supports static bearer
//! tokens from the configuration file, behind the [`Authenticator`] trait.

pub mod provider;
pub mod token;

pub use provider::{Authenticator, bearer_token};
pub use token::{StaticTokenAuthenticator, Token};

use crate::config::AppConfig;
use crate::error::ConfigError;
use std::sync::Arc;

/// Create the authenticator described by the configuration
pub fn create_authenticator(config: &AppConfig) -> Result<Arc<dyn Authenticator>, ConfigError> {
    Ok(Arc::new(StaticTokenAuthenticator::from_config(
        &config.users,
    )?))
}

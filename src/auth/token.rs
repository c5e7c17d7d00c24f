//! Static bearer-token authentication
//!
//! Users and their tokens come from the configuration file. Tokens are held
//! in [`Token`], which never prints its value.

use crate::access_control::Identity;
use crate::auth::provider::{Authenticator, bearer_token};
use crate::config::UserConfig;
use crate::error::{AuthError, ConfigError};
use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;

/// A bearer token. `Debug` and `Display` show `[REDACTED]`.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(Arc<str>);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    /// Explicitly expose the token value.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compare against a presented token in constant time
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Token::new)
    }
}

/// Authenticator backed by the `[[users]]` configuration table
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    users: Vec<(Token, Identity)>,
}

impl StaticTokenAuthenticator {
    /// Build from configured users
    pub fn from_config(users: &[UserConfig]) -> Result<Self, ConfigError> {
        let mut entries = Vec::with_capacity(users.len());
        for user in users {
            if user.token.is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("users[{}].token must not be empty", user.id),
                });
            }
            entries.push((
                user.token.clone(),
                Identity {
                    user_id: user.id,
                    team_ids: user.teams.clone(),
                    is_admin: user.admin,
                },
            ));
        }
        Ok(Self { users: entries })
    }

    /// Register a single token (useful for testing)
    pub fn with_user(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.users.push((Token::new(token), identity));
        self
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let presented = bearer_token(headers)?;

        let identity = self
            .users
            .iter()
            .find(|(token, _)| token.matches(presented))
            .map(|(_, identity)| identity.clone())
            .ok_or(AuthError::InvalidToken)?;

        debug!(
            user = %identity.user_id,
            admin = identity.is_admin,
            "Authenticated request"
        );
        Ok(identity)
    }

    fn auth_type(&self) -> &'static str {
        "Static bearer token"
    }
}

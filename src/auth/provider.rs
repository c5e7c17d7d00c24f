//! Authenticator trait
//!
//! Turns the headers of an inbound request into the caller's [`Identity`].
//! The proxy only depends on this trait, so an external user/team store can
//! replace the static implementation without touching the response filters.

use crate::access_control::Identity;
use crate::error::AuthError;
use axum::http::{HeaderMap, header};
// async_trait required for dyn-compatibility with Arc<dyn Authenticator>
use async_trait::async_trait;

/// Resolves the identity of a proxy caller
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate a request from its headers
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError>;

    /// Get a description of the auth method (for logging)
    fn auth_type(&self) -> &'static str;
}

/// Extract the token of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidToken)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Ok(token)
}

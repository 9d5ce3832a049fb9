//! Authentication: bcrypt password hashing, JWT bearer tokens, and the
//! [`AuthUser`] extractor that guards protected routes.

/// Token issuing and verification
pub mod jwt;
/// Password hashing
pub mod password;

pub use jwt::{Claims, JwtKeys};
pub use password::{hash_password, verify_password};

use crate::errors::{Error, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use std::sync::Arc;

/// The caller identified by a valid bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    /// Id of the authenticated user
    pub user_id: i32,
    /// Email carried in the token
    pub email: String,
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
///
/// # Errors
/// Returns `Error::MissingCredentials` when the header is absent, not valid
/// text, uses another scheme, or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(Error::MissingCredentials)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(Error::MissingCredentials)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(Error::MissingCredentials);
    }
    Ok(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtKeys>: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let keys = Arc::<JwtKeys>::from_ref(state);
        let token = bearer_token(&parts.headers)?;
        keys.verify(token)
    }
}

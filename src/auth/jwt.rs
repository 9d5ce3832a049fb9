//! Issuing and checking bearer tokens.

use crate::auth::AuthUser;
use crate::config::JwtConfig;
use crate::errors::{Error, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Claims carried by every token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string
    #[serde(default)]
    pub sub: String,
    /// User email
    #[serde(default)]
    pub email: String,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// Signing and verification keys built once from [`JwtConfig`].
pub struct JwtKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    expire_minutes: i64,
}

impl JwtKeys {
    /// Builds the keys, accepting only the HMAC family of algorithms.
    ///
    /// # Errors
    /// Returns `Error::Config` if the algorithm name is unknown or not HMAC based.
    pub fn new(config: &JwtConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(config.algorithm.trim()).map_err(|_| Error::Config {
            message: format!("Unknown JWT algorithm: {}", config.algorithm),
        })?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(Error::Config {
                message: format!(
                    "JWT algorithm {algorithm:?} needs a key pair; \
                     only HS256, HS384 and HS512 are supported"
                ),
            });
        }

        Ok(Self {
            algorithm,
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            expire_minutes: config.expire_minutes,
        })
    }

    /// Signs a token for the given user, valid for the configured number of minutes.
    ///
    /// # Errors
    /// Returns `Error::Jwt` if encoding fails.
    pub fn issue(&self, user_id: i32, email: &str) -> Result<String> {
        let exp = Utc::now() + Duration::minutes(self.expire_minutes);
        self.encode(&Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
        })
    }

    /// Signs arbitrary claims.
    ///
    /// # Errors
    /// Returns `Error::Jwt` if encoding fails.
    pub fn encode(&self, claims: &Claims) -> Result<String> {
        Ok(encode(&Header::new(self.algorithm), claims, &self.encoding)?)
    }

    /// Verifies a token and returns the user it belongs to.
    ///
    /// # Errors
    /// - `Error::TokenExpired` if the token is past its `exp`
    /// - `Error::InvalidToken` for any other decoding problem, or when
    ///   `sub` is missing, empty or not a user id, or `email` is missing or empty
    pub fn verify(&self, token: &str) -> Result<AuthUser> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(self.algorithm))
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::TokenExpired,
                _ => {
                    debug!("Rejected token: {e}");
                    Error::InvalidToken
                }
            })?;

        let Claims { sub, email, .. } = data.claims;
        if sub.is_empty() || email.is_empty() {
            return Err(Error::InvalidToken);
        }
        let user_id = sub.parse::<i32>().map_err(|_| Error::InvalidToken)?;

        Ok(AuthUser { user_id, email })
    }
}

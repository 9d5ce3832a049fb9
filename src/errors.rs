//! Unified error type for the whole crate.
//!
//! Every layer (config, schema sync, core logic, HTTP handlers) returns
//! [`Result`]. The HTTP layer turns an [`Error`] into a JSON response of the
//! form `{"detail": "..."}` with a status code chosen by [`Error::status_code`].

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All errors produced by `api-base`.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Any error reported by the database driver or ORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failures (binding the listener, reading files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The database URL or `DIALECT` override names an unsupported backend
    #[error("Unsupported dialect: {dialect}")]
    UnsupportedDialect {
        /// The offending dialect or URL scheme
        dialect: String,
    },

    /// A table or column name is not a plain SQL identifier
    #[error("Invalid identifier: {name}")]
    InvalidIdentifier {
        /// The rejected name
        name: String,
    },

    /// Request payload failed validation
    #[error("{message}")]
    Validation {
        /// Human readable reason
        message: String,
    },

    /// Item price is negative or not a finite number
    #[error("Invalid price: {price}")]
    InvalidPrice {
        /// The rejected price
        price: f64,
    },

    /// No item with the given id
    #[error("Item not found")]
    ItemNotFound {
        /// The id that was looked up
        id: i32,
    },

    /// No user with the given id
    #[error("User not found")]
    UserNotFound {
        /// The id that was looked up
        id: i32,
    },

    /// Registration with an email that already exists
    #[error("Email already registered")]
    EmailTaken {
        /// The duplicate email
        email: String,
    },

    /// Unknown email or wrong password
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// No bearer token on a protected route
    #[error("Not authenticated")]
    MissingCredentials,

    /// Token could not be decoded or is missing claims
    #[error("Invalid token")]
    InvalidToken,

    /// Token signature is fine but `exp` is in the past
    #[error("Token expired")]
    TokenExpired,

    /// Token encoding failures
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failures
    #[error("Password hashing error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

impl Error {
    /// HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InvalidPrice { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ItemNotFound { .. } | Self::UserNotFound { .. } => StatusCode::NOT_FOUND,
            Self::EmailTaken { .. } => StatusCode::CONFLICT,
            Self::InvalidCredentials
            | Self::MissingCredentials
            | Self::InvalidToken
            | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::UnsupportedDialect { .. }
            | Self::InvalidIdentifier { .. }
            | Self::Jwt(_)
            | Self::Bcrypt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Tell axum how to convert an [`Error`] into a response.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal details stay in the logs.
            error!("{self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(json!({ "detail": detail }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation {
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation {
            message: rejection.body_text(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::ItemNotFound { id: 1 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::InvalidPrice { price: -1.0 }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::Config {
                message: "x".to_string()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_response_has_bearer_challenge() {
        let response = Error::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Bearer"))
        );
    }

    #[test]
    fn test_not_found_response_has_no_challenge() {
        let response = Error::ItemNotFound { id: 7 }.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}

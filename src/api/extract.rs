//! Request extractors whose rejections render as [`Error`].
//!
//! axum's own `Json` and `Path` reject with plain-text bodies. These wrappers
//! route the rejection through [`Error`] so a malformed body or a bad path
//! segment answers `422 {"detail": ...}` like every other failure.

use crate::errors::Error;
use axum::{
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// JSON request body, and JSON response.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Typed path parameters.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct Path<T>(pub T);

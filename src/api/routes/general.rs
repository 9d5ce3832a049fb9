//! General routes - health check.

use crate::api::AppState;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

/// Routes that need no authentication and no database.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(root))
}

/// HTTP: report that the service is up.
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

//! HTTP layer - axum router, shared state, and the server loop.
//!
//! Handlers are thin: they extract input, call into [`crate::core`], and let
//! [`crate::errors::Error`] render failures.

/// JSON and path extractors with `{"detail": ...}` rejections
pub mod extract;
/// Route handlers grouped by resource
pub mod routes;

use crate::{auth::AuthUser, auth::JwtKeys, config::ServerConfig, errors::Result};
use axum::{Router, extract::FromRef, middleware::from_extractor_with_state};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    LatencyUnit,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, error, info, warn};

/// Shared data available to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub database: DatabaseConnection,
    /// Token keys
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    /// Creates a new `AppState` from a connection and token keys.
    #[must_use]
    pub fn new(database: DatabaseConnection, jwt: JwtKeys) -> Self {
        Self {
            database,
            jwt: Arc::new(jwt),
        }
    }
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.database.clone()
    }
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.jwt)
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let protected_items = routes::item::router().route_layer(from_extractor_with_state::<
        AuthUser,
        AppState,
    >(state.clone()));

    Router::new()
        .merge(routes::general::router())
        .merge(routes::user::router())
        .merge(protected_items)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .include_headers(false)
                        .level(Level::DEBUG),
                )
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    warn!("Shutting down HTTP server after receiving signal");
}

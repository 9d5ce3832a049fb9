//! User routes - registration, login, and the current user.

use crate::{
    api::{AppState, extract::Json},
    auth::AuthUser,
    core::user::{self, Credentials, LoginResponse, UserPublic},
    errors::{Error, Result},
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;

/// `/users` routes. `/users/me` authenticates through its [`AuthUser`] argument.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/me", get(me))
}

/// HTTP: create an account.
pub async fn register(
    State(db): State<DatabaseConnection>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<UserPublic>)> {
    let user = user::register(&db, &credentials.email, &credentials.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// HTTP: exchange email and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<LoginResponse>> {
    let response = user::login(
        &state.database,
        &state.jwt,
        &credentials.email,
        &credentials.password,
    )
    .await?;
    Ok(Json(response))
}

/// HTTP: the user the token belongs to.
pub async fn me(
    State(db): State<DatabaseConnection>,
    auth: AuthUser,
) -> Result<Json<UserPublic>> {
    let user = user::get_user_by_id(&db, auth.user_id)
        .await?
        .ok_or(Error::UserNotFound { id: auth.user_id })?;
    Ok(Json(user.into()))
}

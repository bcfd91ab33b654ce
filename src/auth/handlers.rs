use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest},
        extractors::{AuthSession, AUTH_HEADER},
        repo::User,
        token::{SigningKeys, TokenPurpose},
    },
    error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/me", get(me))
        .route("/users/me/token", delete(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = User::create(&state.db, &payload.email, &payload.password).await?;

    let keys = SigningKeys::from_ref(&state);
    let token = keys.issue(user.id, TokenPurpose::Auth)?;
    User::add_token(&state.db, user.id, &token).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(([(AUTH_HEADER, token)], Json(PublicUser::from(user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = User::find_by_credentials(&state.db, &payload.email, &payload.password).await?;

    let keys = SigningKeys::from_ref(&state);
    let token = keys.issue(user.id, TokenPurpose::Auth)?;
    User::add_token(&state.db, user.id, &token).await?;

    info!(user_id = %user.id, "user logged in");
    Ok(([(AUTH_HEADER, token)], Json(PublicUser::from(user))))
}

#[instrument(skip(session))]
pub async fn me(session: AuthSession) -> Json<PublicUser> {
    Json(PublicUser::from(session.user))
}

/// Revokes exactly the token that authenticated this request; other
/// sessions stay logged in.
#[instrument(skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<StatusCode, ApiError> {
    User::remove_token(&state.db, session.user.id, &session.token).await?;
    info!(user_id = %session.user.id, "user logged out");
    Ok(StatusCode::OK)
}

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{
    auth::{repo::User, token::SigningKeys},
    error::ApiError,
    state::AppState,
};

pub const AUTH_HEADER: &str = "x-auth";

/// Authenticated request context: the resolved user plus the exact token
/// that was presented, so logout can revoke that session and no other.
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;

        let keys = SigningKeys::from_ref(state);
        let user = match User::find_by_token(&state.db, &keys, token).await {
            Ok(u) => u,
            Err(e @ ApiError::InvalidToken) => {
                warn!("rejected bearer token");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        Ok(AuthSession {
            user,
            token: token.to_string(),
        })
    }
}

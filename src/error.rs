use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Error taxonomy for the whole API surface.
///
/// Handlers and stores return this directly; `IntoResponse` does the
/// translation to HTTP. 401 and 404 responses carry an empty body so the
/// client can never tell a missing record from a foreign one, or a bad
/// token from a revoked one.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("authentication required")]
    Unauthenticated,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
            ApiError::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "email already registered" })),
            )
                .into_response(),
            ApiError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "invalid credentials" })),
            )
                .into_response(),
            ApiError::InvalidToken | ApiError::Unauthenticated => {
                StatusCode::UNAUTHORIZED.into_response()
            }
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Database(e) => {
                error!(error = %e, "database error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let res = ApiError::Validation("text must not be empty".into()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn duplicate_email_and_bad_credentials_map_to_400() {
        assert_eq!(
            ApiError::DuplicateEmail.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidCredentials.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn auth_failures_map_to_401() {
        assert_eq!(
            ApiError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn unauthorized_body_is_empty() {
        let res = ApiError::Unauthenticated.into_response();
        let body = axum::body::to_bytes(res.into_body(), 1024)
            .await
            .expect("read body");
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn not_found_body_is_empty() {
        let res = ApiError::NotFound.into_response();
        let body = axum::body::to_bytes(res.into_body(), 1024)
            .await
            .expect("read body");
        assert!(body.is_empty());
    }
}

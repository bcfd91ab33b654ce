use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        token::{SigningKeys, TokenPurpose},
    },
    error::ApiError,
};

const MIN_PASSWORD_LEN: usize = 6;

/// User record in the database. The password hash never leaves the
/// process; active tokens live in the `user_tokens` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_signup(email: &str, password: &str) -> Result<(), ApiError> {
    if !is_valid_email(email) {
        return Err(ApiError::Validation("invalid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

impl User {
    /// Validate, hash and persist a new user. A unique-index violation on
    /// the email column surfaces as `DuplicateEmail`.
    pub async fn create(db: &PgPool, email: &str, password: &str) -> Result<User, ApiError> {
        let email = email.trim().to_lowercase();
        validate_signup(&email, password)?;
        let password_hash = hash_password(password)?;

        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e))
                if matches!(e.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                warn!(email = %email, "email already registered");
                Err(ApiError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Look up by email and check the password. Unknown email and wrong
    /// password collapse into the same `InvalidCredentials` outcome.
    pub async fn find_by_credentials(
        db: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let email = email.trim().to_lowercase();
        let user = Self::find_by_email(db, &email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;
        if !verify_password(password, &user.password_hash) {
            return Err(ApiError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Resolve a presented bearer token to its user.
    ///
    /// Signature and purpose are checked first, then the user is loaded and
    /// the token must still be present in the active list — a logged-out
    /// token with a valid signature fails here.
    pub async fn find_by_token(
        db: &PgPool,
        keys: &SigningKeys,
        token: &str,
    ) -> Result<User, ApiError> {
        let claims = keys.verify(token)?;
        if claims.access != TokenPurpose::Auth {
            return Err(ApiError::InvalidToken);
        }
        let user = Self::find_by_id(db, claims.sub)
            .await?
            .ok_or(ApiError::InvalidToken)?;
        let active = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM user_tokens
                WHERE user_id = $1 AND token = $2
            )
            "#,
        )
        .bind(user.id)
        .bind(token)
        .fetch_one(db)
        .await?;
        if !active {
            return Err(ApiError::InvalidToken);
        }
        Ok(user)
    }

    /// Append a token to the user's active list in one statement.
    pub async fn add_token(db: &PgPool, user_id: Uuid, token: &str) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO user_tokens (user_id, access, token)
            VALUES ($1, 'auth', $2)
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Match-and-remove exactly one token in one statement, so concurrent
    /// logouts for the same user cannot race each other. Other sessions'
    /// tokens are untouched.
    pub async fn remove_token(db: &PgPool, user_id: Uuid, token: &str) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            DELETE FROM user_tokens
            WHERE user_id = $1 AND token = $2
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Delete the account. Not routed by the current API surface; tokens
    /// and todos go with it via cascade.
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
        sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

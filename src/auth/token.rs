use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// What a token entitles its bearer to. Only session auth exists today.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Auth,
}

/// Payload signed into every bearer token.
///
/// `iat` plus a random `jti` make each issued token distinct even for the
/// same user. There is no `exp`: sessions live until explicit logout, and
/// revocation happens through the stored token list, not the signature.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub jti: Uuid,
    pub access: TokenPurpose,
}

#[derive(Clone)]
pub struct SigningKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl FromRef<AppState> for SigningKeys {
    fn from_ref(state: &AppState) -> Self {
        let secret = state.config.jwt.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl SigningKeys {
    pub fn issue(&self, user_id: Uuid, purpose: TokenPurpose) -> Result<String, ApiError> {
        let claims = Claims {
            sub: user_id,
            iat: OffsetDateTime::now_utc().unix_timestamp() as usize,
            jti: Uuid::new_v4(),
            access: purpose,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .context("sign bearer token")?;
        debug!(user_id = %user_id, "token issued");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        // Tokens carry no expiry; the stored token list is the revocation
        // mechanism.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| ApiError::InvalidToken)?;
        debug!(user_id = %data.claims.sub, "token verified");
        Ok(data.claims)
    }
}

//! Access/refresh token pairs. Access tokens are JWTs; refresh tokens are
//! random secrets stored only as SHA-256 hashes and rotated on every use.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::auth::jwt::{Claims, encode_token};
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token_type: &'static str,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: DateTime<Utc>,
}

pub fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Issue a fresh access token and a new stored refresh token for `user`.
pub async fn issue(state: &AppState, user: &User) -> Result<TokenPair, AppError> {
    let claims = Claims::new(
        user.id,
        user.role,
        Duration::minutes(state.config.access_token_minutes),
    );
    let access_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh_token = generate_refresh_token();
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &hash_token(&refresh_token),
        Utc::now() + Duration::days(state.config.refresh_token_days),
    )
    .await?;

    Ok(TokenPair {
        token_type: "Bearer",
        access_token,
        refresh_token,
        expires_in: claims.expires_at(),
    })
}

/// Exchange a refresh token for a new pair. The presented token is consumed.
pub async fn rotate(state: &AppState, email: &str, refresh_token: &str) -> Result<TokenPair, AppError> {
    let stored = db::refresh_tokens::find_by_hash(&state.pool, &hash_token(refresh_token))
        .await?
        .ok_or_else(invalid_refresh_token)?;

    if stored.used {
        tracing::warn!(
            "Refresh token reuse detected for user {}. Revoking all sessions.",
            stored.user_id
        );
        db::refresh_tokens::delete_all_for_user(&state.pool, stored.user_id).await?;
        return Err(AppError::Unauthorized(
            "Refresh token reuse detected. All sessions revoked.".to_string(),
        ));
    }

    if stored.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or_else(invalid_refresh_token)?;

    if user.email != email {
        return Err(invalid_refresh_token());
    }

    // a concurrent refresh may have consumed it between the read and here
    if !db::refresh_tokens::mark_used(&state.pool, stored.id).await? {
        return Err(invalid_refresh_token());
    }

    issue(state, &user).await
}

/// Forget a refresh token. Unknown tokens are ignored.
pub async fn revoke(state: &AppState, refresh_token: &str) -> Result<(), AppError> {
    db::refresh_tokens::delete_by_hash(&state.pool, &hash_token(refresh_token)).await?;
    Ok(())
}

fn invalid_refresh_token() -> AppError {
    AppError::Unauthorized("Invalid refresh token".to_string())
}

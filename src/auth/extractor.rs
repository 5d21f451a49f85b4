use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use uuid::Uuid;

use crate::auth::{gate, jwt};
use crate::db;
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

/// The verified caller, taken from `Authorization: Bearer <access token>`.
/// The role is the one currently stored, not the one baked into the token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        gate::authorize(self.role, allowed)
    }

    pub fn require_owner_or_admin(&self, owner_id: Option<Uuid>) -> Result<(), AppError> {
        gate::authorize_owner(self.user_id, self.role, owner_id)
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized("Missing authentication token".to_string()))?;

        let claims = jwt::decode_token(bearer.token(), &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        // deleted accounts lose access at once, role changes apply immediately
        let user = db::users::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(AuthUser {
            user_id: user.id,
            role: user.role,
        })
    }
}

pub mod apartments;
pub mod auth;
pub mod users;

use axum::Router;
use axum::routing::{get, post};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/v1/register", post(auth::register))
        .route("/v1/login", post(auth::login))
        .route("/v1/refresh-token", post(auth::refresh_token))
        .route("/v1/logout", post(auth::logout))
        // Users
        .route("/v1/users", get(users::list).post(users::create))
        .route(
            "/v1/users/profile",
            get(users::profile).patch(users::update_profile),
        )
        .route(
            "/v1/users/{id}",
            get(users::get).patch(users::update).delete(users::delete),
        )
        // Apartments
        .route(
            "/v1/apartments",
            get(apartments::list).post(apartments::create),
        )
        .route(
            "/v1/apartments/{id}",
            get(apartments::get)
                .patch(apartments::update)
                .delete(apartments::delete),
        )
}

/// Ids that don't parse can't exist, so they are reported as not found.
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(not_found.to_string()))
}

/// Accounts created without a name fall back to the local part of the email.
pub(crate) fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

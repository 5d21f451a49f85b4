pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod routes;
pub mod state;
pub mod validation;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::password;
use crate::config::Config;
use crate::models::Role;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> Router {
    let cors = cors_layer(&config.cors_origins);
    let max_body_size = config.max_body_size;

    let state: SharedState = Arc::new(AppState { pool, config });

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the configured admin account unless an admin already exists.
pub async fn seed_admin(pool: &PgPool, config: &Config) -> Result<(), String> {
    let Some(seed) = &config.admin_seed else {
        return Ok(());
    };

    let admins = db::users::count_by_role(pool, Role::Admin)
        .await
        .map_err(|e| format!("Failed to count admins: {e}"))?;
    if admins > 0 {
        return Ok(());
    }

    let pw_hash = password::hash(&seed.password)?;
    let user = db::users::create(pool, &seed.email, &pw_hash, &seed.name, Role::Admin)
        .await
        .map_err(|e| format!("Failed to seed admin: {e}"))?;

    tracing::info!("Seeded admin user {} <{}>", user.id, user.email);
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{origin}': {e}");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

async fn health() -> &'static str {
    "ok"
}

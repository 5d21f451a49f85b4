use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::password;
use crate::auth::tokens::{self, TokenPair};
use crate::db;
use crate::error::AppError;
use crate::models::{Role, UserResponse};
use crate::routes::default_name;
use crate::state::SharedState;
use crate::validation::{self, Errors, PASSWORD_MIN, TEXT_MAX};

const LOGIN_FAILED: &str = "Incorrect email or password";

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub email: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: TokenPair,
    pub user: UserResponse,
}

pub async fn register(
    State(state): State<SharedState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let req = validation::extract_json(body)?;

    let mut errors = Errors::new();
    if let Some(email) = errors.required("email", &req.email) {
        errors.email("email", email);
    }
    if let Some(pw) = errors.required("password", &req.password) {
        errors.length("password", pw, PASSWORD_MIN, TEXT_MAX);
    }
    if let Some(name) = &req.name {
        errors.length("name", name, 1, TEXT_MAX);
    }
    let (email, pw) = errors.finish_with(req.email.zip(req.password))?;
    let name = req.name.unwrap_or_else(|| default_name(&email));

    let pw_hash = password::hash(&pw).map_err(AppError::Internal)?;
    let user = db::users::create(&state.pool, &email, &pw_hash, &name, Role::Client)
        .await
        .map_err(AppError::from_user_write)?;

    tracing::info!("User {} registered", user.id);

    let token = tokens::issue(&state, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let req = validation::extract_json(body)?;

    let mut errors = Errors::new();
    if let Some(email) = errors.required("email", &req.email) {
        errors.email("email", email);
    }
    if let Some(pw) = errors.required("password", &req.password) {
        errors.length("password", pw, 1, TEXT_MAX);
    }
    let (email, pw) = errors.finish_with(req.email.zip(req.password))?;

    let Some(user) = db::users::find_by_email(&state.pool, &email).await? else {
        password::verify_dummy(&pw);
        return Err(AppError::Unauthorized(LOGIN_FAILED.to_string()));
    };

    let valid = password::verify(&pw, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::Unauthorized(LOGIN_FAILED.to_string()));
    }

    let token = tokens::issue(&state, &user).await?;
    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

pub async fn refresh_token(
    State(state): State<SharedState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AppError> {
    let req = validation::extract_json(body)?;

    let mut errors = Errors::new();
    if let Some(email) = errors.required("email", &req.email) {
        errors.email("email", email);
    }
    errors.required("refreshToken", &req.refresh_token);
    let (email, refresh) = errors.finish_with(req.email.zip(req.refresh_token))?;

    let pair = tokens::rotate(&state, &email, &refresh).await?;
    Ok(Json(pair))
}

pub async fn logout(
    State(state): State<SharedState>,
    body: Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let req = validation::extract_json(body)?;

    let mut errors = Errors::new();
    errors.required("refreshToken", &req.refresh_token);
    let refresh = errors.finish_with(req.refresh_token)?;

    tokens::revoke(&state, &refresh).await?;
    Ok(StatusCode::NO_CONTENT)
}

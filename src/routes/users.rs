use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::db::users::{UserChanges, UserFilter};
use crate::error::AppError;
use crate::models::{Role, UserResponse};
use crate::routes::{default_name, parse_id};
use crate::state::SharedState;
use crate::validation::{self, Errors, PASSWORD_MIN, TEXT_MAX};

const USER_NOT_FOUND: &str = "User does not exist";
const DEFAULT_PER_PAGE: i64 = 30;
const MAX_PER_PAGE: i64 = 100;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

/// Body for both admin updates and self-service profile updates.
#[derive(Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth.require_role(&[Role::Admin])?;
    let q = validation::extract_query(query)?;

    let mut errors = Errors::new();
    let role = q.role.as_deref().and_then(|r| errors.role("role", r));
    let page = q.page.unwrap_or(1);
    if page < 1 {
        errors.add("page", "\"page\" must be greater than or equal to 1".to_string());
    }
    let per_page = q.per_page.unwrap_or(DEFAULT_PER_PAGE);
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        errors.add(
            "perPage",
            format!("\"perPage\" must be between 1 and {MAX_PER_PAGE}"),
        );
    }

    let filter = UserFilter {
        name: q.name,
        email: q.email,
        role,
        page,
        per_page,
    };
    if page >= 1 && filter.offset().is_none() {
        errors.add("page", "\"page\" is too large".to_string());
    }
    errors.finish()?;

    let users = db::users::list(&state.pool, &filter).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    body: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    auth.require_role(&[Role::Admin])?;
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
    let role = req.role.as_deref().and_then(|r| errors.role("role", r));
    let (email, pw) = errors.finish_with(req.email.zip(req.password))?;
    let name = req.name.unwrap_or_else(|| default_name(&email));

    let pw_hash = password::hash(&pw).map_err(AppError::Internal)?;
    let user = db::users::create(
        &state.pool,
        &email,
        &pw_hash,
        &name,
        role.unwrap_or(Role::Client),
    )
    .await
    .map_err(AppError::from_user_write)?;

    tracing::info!("User {} created by admin {}", user.id, auth.user_id);

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    auth.require_role(&[Role::Admin])?;
    let id = parse_id(&id, USER_NOT_FOUND)?;

    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUser>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    auth.require_role(&[Role::Admin])?;
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let req = validation::extract_json(body)?;

    let changes = validate_changes(req, true)?;
    apply_changes(&state, id, changes).await.map(Json)
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    auth.require_role(&[Role::Admin])?;
    let id = parse_id(&id, USER_NOT_FOUND)?;

    let apartments = db::users::delete_with_apartments(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

    tracing::info!(
        "User {id} deleted by admin {} along with {apartments} apartment(s)",
        auth.user_id
    );

    Ok(StatusCode::NO_CONTENT)
}

pub async fn profile(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    body: Result<Json<UpdateUser>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let req = validation::extract_json(body)?;

    // role changes are reserved for admins, even on their own profile
    let changes = validate_changes(req, false)?;
    apply_changes(&state, auth.user_id, changes).await.map(Json)
}

fn validate_changes(req: UpdateUser, allow_role: bool) -> Result<UserChanges, AppError> {
    let mut errors = Errors::new();
    if let Some(email) = &req.email {
        errors.email("email", email);
    }
    if let Some(pw) = &req.password {
        errors.length("password", pw, PASSWORD_MIN, TEXT_MAX);
    }
    if let Some(name) = &req.name {
        errors.length("name", name, 1, TEXT_MAX);
    }
    let role = match (&req.role, allow_role) {
        (Some(r), true) => errors.role("role", r),
        _ => None,
    };
    errors.finish()?;

    let password_hash = req
        .password
        .as_deref()
        .map(password::hash)
        .transpose()
        .map_err(AppError::Internal)?;

    Ok(UserChanges {
        name: req.name,
        email: req.email,
        password_hash,
        role,
    })
}

async fn apply_changes(
    state: &SharedState,
    id: uuid::Uuid,
    changes: UserChanges,
) -> Result<UserResponse, AppError> {
    let user = db::users::update(&state.pool, id, &changes)
        .await
        .map_err(AppError::from_user_write)?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

    if changes.password_hash.is_some() {
        // a new password ends every existing session
        db::refresh_tokens::delete_all_for_user(&state.pool, user.id).await?;
    }

    Ok(UserResponse::from(user))
}

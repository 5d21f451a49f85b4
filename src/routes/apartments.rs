use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::apartments::{ApartmentChanges, NewApartment};
use crate::error::AppError;
use crate::filter::{ApartmentFilter, ApartmentQuery};
use crate::models::{Apartment, ApartmentResponse, Location, RealtorSummary, Role, UserResponse};
use crate::routes::parse_id;
use crate::state::SharedState;
use crate::validation::{self, Errors};

const APARTMENT_NOT_FOUND: &str = "Apartment does not exist";
const MANAGERS: [Role; 2] = [Role::Admin, Role::Realtor];

#[derive(Deserialize)]
pub struct LocationInput {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Body for both create (all fields required) and update (all optional).
#[derive(Deserialize)]
pub struct ApartmentInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size: Option<f64>,
    pub price: Option<f64>,
    pub rooms: Option<f64>,
    pub location: Option<LocationInput>,
    pub address: Option<String>,
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    query: Result<Query<ApartmentQuery>, QueryRejection>,
) -> Result<Json<Vec<ApartmentResponse<RealtorSummary>>>, AppError> {
    // an unreadable query string means no filters, never a 400
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let filter = ApartmentFilter::from(&query);

    let rows = db::apartments::list(&state.pool, &filter).await?;
    Ok(Json(rows.into_iter().map(ApartmentResponse::from).collect()))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    body: Result<Json<ApartmentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApartmentResponse<UserResponse>>), AppError> {
    auth.require_role(&MANAGERS)?;
    let req = validation::extract_json(body)?;
    let new = validate_new(req)?;

    let record = db::apartments::create(&state.pool, &new, auth.user_id).await?;
    let realtor = db::users::find_by_id(&state.pool, auth.user_id).await?;

    tracing::info!("Apartment {} created by {}", record.id, auth.user_id);

    let apartment = Apartment::new(record, realtor);
    Ok((StatusCode::CREATED, Json(ApartmentResponse::from(apartment))))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ApartmentResponse<UserResponse>>, AppError> {
    let apartment = load(&state, &id).await?;
    Ok(Json(ApartmentResponse::from(apartment)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<ApartmentInput>, JsonRejection>,
) -> Result<Json<ApartmentResponse<UserResponse>>, AppError> {
    auth.require_role(&MANAGERS)?;
    let existing = load(&state, &id).await?;
    auth.require_owner_or_admin(existing.owner_id())?;

    let req = validation::extract_json(body)?;
    let changes = validate_changes(req)?;

    let record = db::apartments::update(&state.pool, existing.record.id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(APARTMENT_NOT_FOUND.to_string()))?;

    let apartment = Apartment {
        record,
        owner: existing.owner,
    };
    Ok(Json(ApartmentResponse::from(apartment)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    auth.require_role(&MANAGERS)?;
    let existing = load(&state, &id).await?;
    auth.require_owner_or_admin(existing.owner_id())?;

    if !db::apartments::delete(&state.pool, existing.record.id).await? {
        return Err(AppError::NotFound(APARTMENT_NOT_FOUND.to_string()));
    }

    tracing::info!("Apartment {} deleted by {}", existing.record.id, auth.user_id);

    Ok(StatusCode::NO_CONTENT)
}

async fn load(state: &SharedState, raw_id: &str) -> Result<Apartment, AppError> {
    let id = parse_id(raw_id, APARTMENT_NOT_FOUND)?;
    db::apartments::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(APARTMENT_NOT_FOUND.to_string()))
}

fn validate_new(req: ApartmentInput) -> Result<NewApartment, AppError> {
    let mut errors = Errors::new();
    for (field, value) in [
        ("name", &req.name),
        ("description", &req.description),
        ("address", &req.address),
    ] {
        if let Some(text) = errors.required(field, value) {
            errors.length(field, text, 1, usize::MAX);
        }
    }
    if let Some(size) = errors.required("size", &req.size) {
        errors.positive("size", *size);
    }
    if let Some(price) = errors.required("price", &req.price) {
        errors.positive("price", *price);
    }
    let rooms = errors
        .required("rooms", &req.rooms)
        .and_then(|r| errors.positive_integer("rooms", *r));

    let location = match errors.required("location", &req.location) {
        Some(loc) => {
            let lat = errors.required("location.lat", &loc.lat).copied();
            let lng = errors.required("location.lng", &loc.lng).copied();
            if let Some(lat) = lat {
                errors.finite("location.lat", lat);
            }
            if let Some(lng) = lng {
                errors.finite("location.lng", lng);
            }
            lat.zip(lng).map(|(lat, lng)| Location { lat, lng })
        }
        None => None,
    };

    let required = (|| {
        Some(NewApartment {
            name: req.name?,
            description: req.description?,
            size: req.size?,
            price: req.price?,
            rooms: rooms?,
            location: location?,
            address: req.address?,
        })
    })();
    errors.finish_with(required)
}

fn validate_changes(req: ApartmentInput) -> Result<ApartmentChanges, AppError> {
    let mut errors = Errors::new();
    for (field, value) in [
        ("name", &req.name),
        ("description", &req.description),
        ("address", &req.address),
    ] {
        if let Some(text) = value {
            errors.length(field, text, 1, usize::MAX);
        }
    }
    if let Some(size) = req.size {
        errors.positive("size", size);
    }
    if let Some(price) = req.price {
        errors.positive("price", price);
    }
    let rooms = req.rooms.and_then(|r| errors.positive_integer("rooms", r));
    let (lat, lng) = match &req.location {
        Some(loc) => (loc.lat, loc.lng),
        None => (None, None),
    };
    if let Some(lat) = lat {
        errors.finite("location.lat", lat);
    }
    if let Some(lng) = lng {
        errors.finite("location.lng", lng);
    }
    errors.finish()?;

    Ok(ApartmentChanges {
        name: req.name,
        description: req.description,
        size: req.size,
        price: req.price,
        rooms,
        lat,
        lng,
        address: req.address,
    })
}

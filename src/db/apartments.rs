use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db;
use crate::filter::ApartmentFilter;
use crate::models::{Apartment, ApartmentListing, ApartmentRecord, Location};

#[derive(Debug, Clone)]
pub struct NewApartment {
    pub name: String,
    pub description: String,
    pub size: f64,
    pub price: f64,
    pub rooms: i32,
    pub location: Location,
    pub address: String,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ApartmentChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size: Option<f64>,
    pub price: Option<f64>,
    pub rooms: Option<i32>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
}

pub async fn create(
    pool: &PgPool,
    apartment: &NewApartment,
    realtor_id: Uuid,
) -> Result<ApartmentRecord, sqlx::Error> {
    sqlx::query_as::<_, ApartmentRecord>(
        "INSERT INTO apartments
            (id, name, description, size, price, rooms, lat, lng, address, realtor_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&apartment.name)
    .bind(&apartment.description)
    .bind(apartment.size)
    .bind(apartment.price)
    .bind(apartment.rooms)
    .bind(apartment.location.lat)
    .bind(apartment.location.lng)
    .bind(&apartment.address)
    .bind(realtor_id)
    .fetch_one(pool)
    .await
}

/// Load an apartment with its realtor resolved to the full user row.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Apartment>, sqlx::Error> {
    let record = sqlx::query_as::<_, ApartmentRecord>("SELECT * FROM apartments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(record) = record else {
        return Ok(None);
    };

    let realtor = match record.realtor_id {
        Some(realtor_id) => db::users::find_by_id(pool, realtor_id).await?,
        None => None,
    };

    Ok(Some(Apartment::new(record, realtor)))
}

/// Filtered listing, oldest first, each row joined with its realtor.
pub async fn list(pool: &PgPool, filter: &ApartmentFilter) -> Result<Vec<ApartmentListing>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT a.*, u.name AS realtor_name, u.email AS realtor_email
         FROM apartments a
         JOIN users u ON u.id = a.realtor_id
         WHERE TRUE",
    );
    filter.push_predicates(&mut qb);
    qb.push(" ORDER BY a.created_at ASC, a.id ASC");

    qb.build_query_as::<ApartmentListing>().fetch_all(pool).await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &ApartmentChanges,
) -> Result<Option<ApartmentRecord>, sqlx::Error> {
    sqlx::query_as::<_, ApartmentRecord>(
        "UPDATE apartments SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            size = COALESCE($4, size),
            price = COALESCE($5, price),
            rooms = COALESCE($6, rooms),
            lat = COALESCE($7, lat),
            lng = COALESCE($8, lng),
            address = COALESCE($9, address),
            updated_at = clock_timestamp()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.size)
    .bind(changes.price)
    .bind(changes.rooms)
    .bind(changes.lat)
    .bind(changes.lng)
    .bind(changes.address.as_deref())
    .fetch_optional(pool)
    .await
}

/// Returns false if no apartment had that id.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM apartments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

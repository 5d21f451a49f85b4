use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::user::{RealtorSummary, User, UserResponse};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Who owns an apartment, as far as the caller has loaded it.
#[derive(Debug, Clone)]
pub enum Owner {
    Reference(Uuid),
    Resolved(User),
}

impl Owner {
    pub fn id(&self) -> Uuid {
        match self {
            Owner::Reference(id) => *id,
            Owner::Resolved(user) => user.id,
        }
    }
}

/// A stored apartment row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApartmentRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub size: f64,
    pub price: f64,
    pub rooms: i32,
    pub lat: f64,
    pub lng: f64,
    pub address: String,
    pub realtor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Apartment {
    pub record: ApartmentRecord,
    pub owner: Option<Owner>,
}

impl Apartment {
    pub fn new(record: ApartmentRecord, realtor: Option<User>) -> Self {
        let owner = match realtor {
            Some(user) => Some(Owner::Resolved(user)),
            None => record.realtor_id.map(Owner::Reference),
        };
        Self { record, owner }
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner.as_ref().map(Owner::id)
    }
}

/// A listing row: the apartment joined with its owner's reduced identity.
#[derive(Debug, Clone)]
pub struct ApartmentListing {
    pub record: ApartmentRecord,
    pub realtor: RealtorSummary,
}

// The joined columns are aliased `realtor_name` / `realtor_email` so they don't
// collide with the apartment's own `name`.
impl<'r> FromRow<'r, PgRow> for ApartmentListing {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let record = ApartmentRecord::from_row(row)?;
        let realtor = RealtorSummary {
            id: row.try_get("realtor_id")?,
            name: row.try_get("realtor_name")?,
            email: row.try_get("realtor_email")?,
        };
        Ok(Self { record, realtor })
    }
}

/// Wire shape of an apartment, generic over how the realtor is projected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentResponse<R> {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub size: f64,
    pub price: f64,
    pub rooms: i32,
    pub location: Location,
    pub address: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtor: Option<R>,
}

impl<R> ApartmentResponse<R> {
    fn from_record(record: ApartmentRecord, realtor: Option<R>) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            size: record.size,
            price: record.price,
            rooms: record.rooms,
            location: Location {
                lat: record.lat,
                lng: record.lng,
            },
            address: record.address,
            created_at: record.created_at,
            realtor,
        }
    }
}

impl From<Apartment> for ApartmentResponse<UserResponse> {
    fn from(apartment: Apartment) -> Self {
        let realtor = match apartment.owner {
            Some(Owner::Resolved(user)) => Some(UserResponse::from(user)),
            Some(Owner::Reference(_)) | None => None,
        };
        Self::from_record(apartment.record, realtor)
    }
}

impl From<ApartmentListing> for ApartmentResponse<RealtorSummary> {
    fn from(row: ApartmentListing) -> Self {
        Self::from_record(row.record, Some(row.realtor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn record(realtor_id: Option<Uuid>) -> ApartmentRecord {
        ApartmentRecord {
            id: Uuid::now_v7(),
            name: "California Apartment".to_string(),
            description: "Best apartment in california".to_string(),
            size: 120.0,
            price: 402.0,
            rooms: 5,
            lat: 35.358243,
            lng: -119.1207586,
            address: "10300-10498 Hinderhill Dr, Bakersfield, CA 93312, USA".to_string(),
            realtor_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn realtor() -> User {
        User {
            id: Uuid::now_v7(),
            email: "nathan@gmail.com".to_string(),
            password_hash: "$argon2id$v=19$hash".to_string(),
            name: "Nathan Murray".to_string(),
            role: Role::Realtor,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn resolved_owner_goes_through_user_allow_list() {
        let user = realtor();
        let apartment = Apartment::new(record(Some(user.id)), Some(user.clone()));
        assert_eq!(apartment.owner_id(), Some(user.id));

        let json = serde_json::to_value(ApartmentResponse::from(apartment)).unwrap();
        assert_eq!(json["realtor"]["email"], "nathan@gmail.com");
        assert_eq!(json["location"]["lat"], 35.358243);
        assert!(json["realtor"].get("passwordHash").is_none());
        assert!(json["realtor"].get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn bare_reference_is_omitted() {
        let owner = Uuid::now_v7();
        let apartment = Apartment::new(record(Some(owner)), None);
        assert_eq!(apartment.owner_id(), Some(owner));

        let json = serde_json::to_value(ApartmentResponse::from(apartment)).unwrap();
        assert!(json.get("realtor").is_none());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn listing_row_exposes_reduced_realtor() {
        let user = realtor();
        let row = ApartmentListing {
            record: record(Some(user.id)),
            realtor: RealtorSummary {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
            },
        };
        let json = serde_json::to_value(ApartmentResponse::from(row)).unwrap();
        let mut keys: Vec<_> = json["realtor"].as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["email", "id", "name"]);
    }
}

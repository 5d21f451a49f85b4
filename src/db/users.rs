use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{Role, User};

/// Exact-match filters and paging for the admin user listing.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub page: i64,
    pub per_page: i64,
}

impl UserFilter {
    /// Rows to skip for `page`, or `None` when the page lies beyond any addressable row.
    pub fn offset(&self) -> Option<i64> {
        self.page.checked_sub(1)?.max(0).checked_mul(self.per_page)
    }
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
    password_hash: &str,
    name: &str,
    role: Role,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, email, password_hash, name, role)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn count_by_role(pool: &PgPool, role: Role) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = $1")
        .bind(role)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn list(pool: &PgPool, filter: &UserFilter) -> Result<Vec<User>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM users WHERE TRUE");
    if let Some(name) = &filter.name {
        qb.push(" AND name = ").push_bind(name.clone());
    }
    if let Some(email) = &filter.email {
        qb.push(" AND email = ").push_bind(email.clone());
    }
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role);
    }
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(filter.per_page)
        .push(" OFFSET ")
        .push_bind(filter.offset().unwrap_or(i64::MAX));

    qb.build_query_as::<User>().fetch_all(pool).await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &UserChanges,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            password_hash = COALESCE($4, password_hash),
            role = COALESCE($5, role),
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.email.as_deref())
    .bind(changes.password_hash.as_deref())
    .bind(changes.role)
    .fetch_optional(pool)
    .await
}

/// Delete a user and every apartment they own in one transaction.
/// Returns the number of apartments removed, or `None` if the user didn't exist.
pub async fn delete_with_apartments(pool: &PgPool, id: Uuid) -> Result<Option<u64>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let apartments = sqlx::query("DELETE FROM apartments WHERE realtor_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    tx.commit().await?;
    Ok(Some(apartments))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paged(page: i64, per_page: i64) -> UserFilter {
        UserFilter {
            page,
            per_page,
            ..UserFilter::default()
        }
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(paged(1, 30).offset(), Some(0));
        assert_eq!(paged(3, 30).offset(), Some(60));
    }

    #[test]
    fn offset_overflow_is_none() {
        assert_eq!(paged(i64::MAX, 30).offset(), None);
        assert_eq!(paged(i64::MAX / 2, 100).offset(), None);
        assert_eq!(paged(i64::MAX, 1).offset(), Some(i64::MAX - 1));
    }
}

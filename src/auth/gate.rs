//! Role and ownership checks. Every denial is the same `Forbidden`, so a
//! caller can't tell which check failed.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;

/// Allow iff `allowed` is empty (any authenticated caller) or contains `role`.
pub fn authorize(role: Role, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.is_empty() || allowed.contains(&role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Allow the owner of a resource, or anyone holding an elevated role.
pub fn authorize_owner(caller_id: Uuid, role: Role, owner_id: Option<Uuid>) -> Result<(), AppError> {
    if is_elevated(role) || owner_id == Some(caller_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn is_elevated(role: Role) -> bool {
    match role {
        Role::Admin => true,
        Role::Realtor | Role::Client => false,
    }
}

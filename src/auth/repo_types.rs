use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // assigned by the store
    pub email: String,              // unique
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,    // Argon2 digest, not exposed in JSON
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_active: bool,
}

/// Fields for a user that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    pub created_at: OffsetDateTime,
    pub is_active: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Duplicate,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

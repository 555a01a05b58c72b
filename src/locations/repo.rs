use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{locations::dto::SavedLocation, weather::dto::Location};

/// Upper bound on locations returned per user.
pub const LIST_LIMIT: i64 = 100;

#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn insert(&self, user_id: Uuid, location: &Location, is_default: bool) -> anyhow::Result<Uuid>;
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<SavedLocation>>;
}

#[derive(Debug, FromRow)]
struct SavedLocationRow {
    id: Uuid,
    user_id: Uuid,
    city: Option<String>,
    country: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    is_default: bool,
}

impl From<SavedLocationRow> for SavedLocation {
    fn from(r: SavedLocationRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            location: Location {
                city: r.city,
                country: r.country,
                lat: r.lat,
                lon: r.lon,
            },
            is_default: r.is_default,
        }
    }
}

#[derive(Clone)]
pub struct PgLocationStore {
    db: PgPool,
}

impl PgLocationStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LocationStore for PgLocationStore {
    async fn insert(&self, user_id: Uuid, location: &Location, is_default: bool) -> anyhow::Result<Uuid> {
        let (id,) = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO saved_locations (user_id, city, country, lat, lon, is_default)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&location.city)
        .bind(&location.country)
        .bind(location.lat)
        .bind(location.lon)
        .bind(is_default)
        .fetch_one(&self.db)
        .await
        .context("insert saved location")?;
        Ok(id)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<SavedLocation>> {
        let rows = sqlx::query_as::<_, SavedLocationRow>(
            r#"
            SELECT id, user_id, city, country, lat, lon, is_default
              FROM saved_locations
             WHERE user_id = $1
             ORDER BY created_at ASC
             LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(LIST_LIMIT)
        .fetch_all(&self.db)
        .await
        .context("list saved locations")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

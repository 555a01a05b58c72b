use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Device {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fcm_token: String,
    pub device_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_used: OffsetDateTime,
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn insert(&self, user_id: Uuid, fcm_token: &str, device_type: &str) -> anyhow::Result<Device>;
    async fn list_all(&self) -> anyhow::Result<Vec<Device>>;
}

#[derive(Clone)]
pub struct PgDeviceStore {
    db: PgPool,
}

impl PgDeviceStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeviceStore for PgDeviceStore {
    async fn insert(&self, user_id: Uuid, fcm_token: &str, device_type: &str) -> anyhow::Result<Device> {
        let device = sqlx::query_as::<_, Device>(
            r#"
            INSERT INTO devices (user_id, fcm_token, device_type)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, fcm_token, device_type, created_at, last_used
            "#,
        )
        .bind(user_id)
        .bind(fcm_token)
        .bind(device_type)
        .fetch_one(&self.db)
        .await
        .context("insert device")?;
        Ok(device)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Device>> {
        let rows = sqlx::query_as::<_, Device>(
            r#"
            SELECT id, user_id, fcm_token, device_type, created_at, last_used
              FROM devices
             ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list devices")?;
        Ok(rows)
    }
}

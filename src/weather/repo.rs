use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::weather::dto::WeatherSnapshot;

/// Append-only log of fetched snapshots.
#[async_trait]
pub trait WeatherHistory: Send + Sync {
    async fn record(&self, snapshot: &WeatherSnapshot) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgWeatherHistory {
    db: PgPool,
}

impl PgWeatherHistory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WeatherHistory for PgWeatherHistory {
    async fn record(&self, snapshot: &WeatherSnapshot) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO weather_history (city, country, lat, lon, fetched_at, current, forecast)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&snapshot.location.city)
        .bind(&snapshot.location.country)
        .bind(snapshot.location.lat)
        .bind(snapshot.location.lon)
        .bind(snapshot.timestamp)
        .bind(Json(&snapshot.current))
        .bind(Json(&snapshot.forecast))
        .execute(&self.db)
        .await
        .context("insert weather history")?;
        Ok(())
    }
}

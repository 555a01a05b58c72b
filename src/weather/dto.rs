use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

/// Place descriptor, used as request input and embedded in snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// Normalized metrics shared by current conditions and forecast entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub weather_description: String,
    pub weather_icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(flatten)]
    pub conditions: Conditions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub current: Conditions,
    pub forecast: Vec<ForecastEntry>,
}

/// Raw lookup input: a city name or a coordinate pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl WeatherQuery {
    pub fn city(name: impl Into<String>) -> Self {
        Self {
            city: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Self {
            city: None,
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    /// A non-blank city wins over coordinates.
    pub fn target(&self) -> AppResult<Target> {
        if let Some(city) = self.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            return Ok(Target::City(city.to_owned()));
        }
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok(Target::Coordinates { lat, lon }),
            _ => Err(AppError::BadRequest(
                "Either city or coordinates required".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CoordinatesParams {
    pub lat: f64,
    pub lon: f64,
}

// ---- OpenWeather payloads ----

#[derive(Debug, Deserialize)]
pub(crate) struct OwCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OwSys {
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwWind {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwWeather {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwCurrent {
    pub coord: OwCoord,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sys: OwSys,
    pub main: OwMain,
    pub wind: OwWind,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastItem {
    pub dt: i64,
    pub main: OwMain,
    pub wind: OwWind,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecast {
    pub list: Vec<OwForecastItem>,
}

use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Argon2 cost factors. Defaults follow `argon2::Params::default()`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HashCost {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            m_cost: argon2::Params::DEFAULT_M_COST,
            t_cost: argon2::Params::DEFAULT_T_COST,
            p_cost: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub hash_cost: HashCost,
    pub weather: WeatherConfig,
    pub firebase_credentials: Option<PathBuf>,
}

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(DEFAULT_TOKEN_TTL_MINUTES),
        };

        let defaults = HashCost::default();
        let hash_cost = HashCost {
            m_cost: env_parse("ARGON2_M_COST").unwrap_or(defaults.m_cost),
            t_cost: env_parse("ARGON2_T_COST").unwrap_or(defaults.t_cost),
            p_cost: env_parse("ARGON2_P_COST").unwrap_or(defaults.p_cost),
        };

        let weather = WeatherConfig {
            api_key: std::env::var("OPENWEATHER_API_KEY")
                .context("OPENWEATHER_API_KEY is not set")?,
            base_url: std::env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENWEATHER_BASE_URL.into()),
        };

        let firebase_credentials = std::env::var("FIREBASE_CREDENTIALS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            database_url,
            jwt,
            hash_cost,
            weather,
            firebase_credentials,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

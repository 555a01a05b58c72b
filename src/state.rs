use std::sync::Arc;

use crate::{
    auth::{
        jwt::JwtKeys,
        password::Hasher,
        repo::{PgUserStore, UserStore},
    },
    config::AppConfig,
    db,
    locations::repo::{LocationStore, PgLocationStore},
    notifications::{
        fcm::FcmClient,
        repo::{DeviceStore, PgDeviceStore},
        services::PushSender,
    },
    weather::{
        provider::{OpenWeatherClient, WeatherProvider},
        repo::{PgWeatherHistory, WeatherHistory},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub hasher: Arc<Hasher>,
    pub users: Arc<dyn UserStore>,
    pub locations: Arc<dyn LocationStore>,
    pub devices: Arc<dyn DeviceStore>,
    pub history: Arc<dyn WeatherHistory>,
    pub weather: Arc<dyn WeatherProvider>,
    pub push: Option<Arc<dyn PushSender>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = db::connect(&config.database_url).await?;
        db::migrate(&db).await;

        let push = match &config.firebase_credentials {
            Some(path) => Some(Arc::new(FcmClient::from_file(path)?) as Arc<dyn PushSender>),
            None => {
                tracing::warn!("FIREBASE_CREDENTIALS not set; push notifications disabled");
                None
            }
        };

        Ok(Self {
            keys: JwtKeys::from_config(&config.jwt),
            hasher: Arc::new(Hasher::new(config.hash_cost)?),
            users: Arc::new(PgUserStore::new(db.clone())),
            locations: Arc::new(PgLocationStore::new(db.clone())),
            devices: Arc::new(PgDeviceStore::new(db.clone())),
            history: Arc::new(PgWeatherHistory::new(db)),
            weather: Arc::new(OpenWeatherClient::new(&config.weather.base_url)?),
            push,
            config,
        })
    }
}

use anyhow::Context;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::{
    error::{AppError, AppResult},
    weather::{
        dto::{
            Conditions, ForecastEntry, Location, OwCurrent, OwForecast, OwMain, OwWeather, OwWind,
            Target, WeatherQuery, WeatherSnapshot,
        },
        provider::{Endpoint, ProviderResponse, QueryParams, WeatherProvider},
        repo::WeatherHistory,
    },
};

fn base_params(api_key: &str) -> QueryParams {
    vec![("appid", api_key.to_owned()), ("units", "metric".to_owned())]
}

fn coordinate_params(api_key: &str, lat: f64, lon: f64) -> QueryParams {
    let mut params = base_params(api_key);
    params.push(("lat", lat.to_string()));
    params.push(("lon", lon.to_string()));
    params
}

/// Non-2xx answers stop the pipeline with the upstream status and body.
async fn call<T: DeserializeOwned>(
    provider: &dyn WeatherProvider,
    endpoint: Endpoint,
    params: &QueryParams,
) -> AppResult<T> {
    let ProviderResponse { status, body } = provider
        .get(endpoint, params)
        .await
        .context("weather provider unreachable")?;

    if !(200..300).contains(&status) {
        warn!(endpoint = endpoint.path(), status, "weather provider returned an error");
        return Err(AppError::Upstream { status, body });
    }

    let parsed = serde_json::from_str(&body)
        .with_context(|| format!("parse weather provider {} payload", endpoint.path()))?;
    Ok(parsed)
}

/// The first `weather` entry is the headline condition; a payload without one is malformed.
fn conditions(main: &OwMain, wind: &OwWind, weather: &[OwWeather]) -> anyhow::Result<Conditions> {
    let headline = weather
        .first()
        .context("weather provider payload has no weather conditions")?;
    Ok(Conditions {
        temp: main.temp,
        feels_like: main.feels_like,
        humidity: main.humidity,
        pressure: main.pressure,
        wind_speed: wind.speed,
        weather_description: headline.description.clone(),
        weather_icon: headline.icon.clone(),
    })
}

fn normalize(current: OwCurrent, forecast: OwForecast) -> AppResult<WeatherSnapshot> {
    let entries = forecast
        .list
        .iter()
        .map(|item| {
            let timestamp = OffsetDateTime::from_unix_timestamp(item.dt)
                .with_context(|| format!("forecast timestamp {} out of range", item.dt))?;
            Ok(ForecastEntry {
                timestamp,
                conditions: conditions(&item.main, &item.wind, &item.weather)
                    .with_context(|| format!("forecast entry at {}", item.dt))?,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(WeatherSnapshot {
        location: Location {
            city: current.name.clone(),
            country: current.sys.country.clone(),
            lat: Some(current.coord.lat),
            lon: Some(current.coord.lon),
        },
        timestamp: OffsetDateTime::now_utc(),
        current: conditions(&current.main, &current.wind, &current.weather)?,
        forecast: entries,
    })
}

/// Fetches current conditions and forecast for one place.
///
/// The forecast is requested with the coordinates the provider resolved for
/// the current-conditions call, so a city lookup and its forecast always
/// describe the same place. A failed history write is logged and does not
/// fail the fetch.
pub async fn fetch_weather(
    provider: &dyn WeatherProvider,
    api_key: &str,
    query: &WeatherQuery,
    history: Option<&dyn WeatherHistory>,
) -> AppResult<WeatherSnapshot> {
    let target = query.target()?;

    let mut params = base_params(api_key);
    match &target {
        Target::City(city) => params.push(("q", city.clone())),
        Target::Coordinates { lat, lon } => {
            params.push(("lat", lat.to_string()));
            params.push(("lon", lon.to_string()));
        }
    }

    let current: OwCurrent = call(provider, Endpoint::Current, &params).await?;
    let (lat, lon) = (current.coord.lat, current.coord.lon);
    debug!(?target, lat, lon, "resolved location");

    let forecast: OwForecast =
        call(provider, Endpoint::Forecast, &coordinate_params(api_key, lat, lon)).await?;

    let snapshot = normalize(current, forecast)?;

    if let Some(history) = history {
        let record = WeatherSnapshot {
            timestamp: OffsetDateTime::now_utc(),
            ..snapshot.clone()
        };
        if let Err(e) = history.record(&record).await {
            error!(error = ?e, "failed to record weather history");
        }
    }

    info!(
        city = snapshot.location.city.as_deref().unwrap_or(""),
        entries = snapshot.forecast.len(),
        "weather fetched"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProvider, MemoryHistory};
    use serde_json::json;

    fn london_current() -> serde_json::Value {
        json!({
            "coord": {"lat": 51.5, "lon": -0.13},
            "name": "London",
            "sys": {"country": "GB"},
            "main": {"temp": 12.3, "feels_like": 11.0, "humidity": 81, "pressure": 1012},
            "wind": {"speed": 4.1},
            "weather": [{"description": "light rain", "icon": "10d"}],
            "dt": 1700000000
        })
    }

    fn forecast_body() -> serde_json::Value {
        json!({
            "list": [
                {
                    "dt": 1700010800,
                    "main": {"temp": 10.0, "feels_like": 9.0, "humidity": 85, "pressure": 1011},
                    "wind": {"speed": 5.0},
                    "weather": [{"description": "overcast clouds", "icon": "04n"}]
                },
                {
                    "dt": 1700021600,
                    "main": {"temp": 9.5, "feels_like": 8.1, "humidity": 88, "pressure": 1010},
                    "wind": {"speed": 5.5},
                    "weather": [{"description": "rain", "icon": "10n"}]
                }
            ]
        })
    }

    fn param<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[tokio::test]
    async fn city_lookup_forecasts_resolved_coordinates() {
        let provider = FakeProvider::new()
            .respond(Endpoint::Current, 200, london_current())
            .respond(Endpoint::Forecast, 200, forecast_body());

        let snap = fetch_weather(&provider, "KEY", &WeatherQuery::city("London"), None)
            .await
            .unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        let (ep, current_params) = &calls[0];
        assert_eq!(*ep, Endpoint::Current);
        assert_eq!(param(current_params, "q"), Some("London"));
        assert_eq!(param(current_params, "appid"), Some("KEY"));
        assert_eq!(param(current_params, "units"), Some("metric"));
        assert_eq!(param(current_params, "lat"), None);

        let (ep, forecast_params) = &calls[1];
        assert_eq!(*ep, Endpoint::Forecast);
        assert_eq!(param(forecast_params, "lat"), Some("51.5"));
        assert_eq!(param(forecast_params, "lon"), Some("-0.13"));
        assert_eq!(param(forecast_params, "q"), None);

        assert_eq!(snap.location.city.as_deref(), Some("London"));
        assert_eq!(snap.location.country.as_deref(), Some("GB"));
        assert_eq!(snap.location.lat, Some(51.5));
    }

    #[tokio::test]
    async fn normalizes_provider_fields() {
        let provider = FakeProvider::new()
            .respond(Endpoint::Current, 200, london_current())
            .respond(Endpoint::Forecast, 200, forecast_body());

        let snap = fetch_weather(&provider, "KEY", &WeatherQuery::coordinates(51.51, -0.12), None)
            .await
            .unwrap();

        assert_eq!(
            snap.current,
            Conditions {
                temp: 12.3,
                feels_like: 11.0,
                humidity: 81.0,
                pressure: 1012.0,
                wind_speed: 4.1,
                weather_description: "light rain".into(),
                weather_icon: "10d".into(),
            }
        );
        assert_eq!(snap.forecast.len(), 2);
        assert_eq!(snap.forecast[0].timestamp.unix_timestamp(), 1700010800);
        assert_eq!(snap.forecast[1].conditions.weather_description, "rain");
        // coordinates mode still forecasts where the provider resolved to
        let calls = provider.calls();
        assert_eq!(param(&calls[0].1, "lat"), Some("51.51"));
        assert_eq!(param(&calls[1].1, "lat"), Some("51.5"));
    }

    #[tokio::test]
    async fn missing_target_fails_before_any_call() {
        let provider = FakeProvider::new();
        let err = fetch_weather(&provider, "KEY", &WeatherQuery::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn upstream_404_short_circuits() {
        let provider = FakeProvider::new().respond(
            Endpoint::Current,
            404,
            json!({"cod": "404", "message": "city not found"}),
        );
        let history = MemoryHistory::default();

        let err = fetch_weather(&provider, "KEY", &WeatherQuery::city("Atlantis"), Some(&history))
            .await
            .unwrap_err();

        match err {
            AppError::Upstream { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("city not found"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(provider.calls().len(), 1);
        assert!(history.records().is_empty());
    }

    #[tokio::test]
    async fn forecast_failure_is_upstream_error() {
        let provider = FakeProvider::new()
            .respond(Endpoint::Current, 200, london_current())
            .respond(Endpoint::Forecast, 401, json!({"message": "bad key"}));
        let err = fetch_weather(&provider, "KEY", &WeatherQuery::city("London"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 401, .. }));
    }

    #[tokio::test]
    async fn malformed_payload_is_internal() {
        let provider = FakeProvider::new().respond(Endpoint::Current, 200, json!({"oops": true}));
        let err = fetch_weather(&provider, "KEY", &WeatherQuery::city("London"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn current_without_weather_conditions_is_internal() {
        for weather in [Some(json!([])), None] {
            let mut current = london_current();
            match weather {
                Some(w) => current["weather"] = w,
                None => {
                    current.as_object_mut().unwrap().remove("weather");
                }
            }
            let provider = FakeProvider::new()
                .respond(Endpoint::Current, 200, current)
                .respond(Endpoint::Forecast, 200, forecast_body());
            let history = MemoryHistory::default();

            let err = fetch_weather(&provider, "KEY", &WeatherQuery::city("London"), Some(&history))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Internal(_)), "got {err:?}");
            assert!(history.records().is_empty());
        }
    }

    #[tokio::test]
    async fn forecast_entry_without_weather_conditions_is_internal() {
        let mut forecast = forecast_body();
        forecast["list"][1]["weather"] = json!([]);
        let provider = FakeProvider::new()
            .respond(Endpoint::Current, 200, london_current())
            .respond(Endpoint::Forecast, 200, forecast);

        let err = fetch_weather(&provider, "KEY", &WeatherQuery::city("London"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn snapshot_is_recorded_with_fresh_timestamp() {
        let provider = FakeProvider::new()
            .respond(Endpoint::Current, 200, london_current())
            .respond(Endpoint::Forecast, 200, forecast_body());
        let history = MemoryHistory::default();

        let snap = fetch_weather(&provider, "KEY", &WeatherQuery::city("London"), Some(&history))
            .await
            .unwrap();

        let records = history.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].timestamp >= snap.timestamp);
        assert_eq!(records[0].current, snap.current);
        assert_eq!(records[0].forecast, snap.forecast);
    }

    #[tokio::test]
    async fn history_failure_does_not_fail_fetch() {
        let provider = FakeProvider::new()
            .respond(Endpoint::Current, 200, london_current())
            .respond(Endpoint::Forecast, 200, forecast_body());
        let history = MemoryHistory::failing();

        let snap = fetch_weather(&provider, "KEY", &WeatherQuery::city("London"), Some(&history))
            .await
            .unwrap();
        assert_eq!(snap.forecast.len(), 2);
    }
}
